//! Wire identification of replicated objects.
//!
//! Every replicated object is addressed on the wire by the pair `(id, type)`.
//! Receivers rebuild the object through [`crate::entities::Entities::get`] with
//! exactly this pair. Gameplay payloads that follow the header are opaque here.
//!
//! Layout (big-endian):
//!
//! ```text
//! ┌──────────────┬──────────┐
//! │ id (8 bytes) │ type (1) │
//! └──────────────┴──────────┘
//! ```

use anyhow::bail;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::entity_type::EntityType;

/// Encoded size of an [`EntityHeader`].
pub const HEADER_LEN: usize = 9;

/// Identification pair stamped on every replicated object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityHeader {
    pub id: u64,
    pub ty: EntityType,
}

impl EntityHeader {
    pub fn new(id: u64, ty: EntityType) -> Self {
        Self { id, ty }
    }

    /// Header for a freshly constructed object that the registry has not stamped yet.
    pub fn unassigned(ty: EntityType) -> Self {
        Self { id: 0, ty }
    }

    pub fn write(&self, buf: &mut impl BufMut) {
        buf.put_u64(self.id);
        buf.put_u8(self.ty.code());
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN);
        self.write(&mut buf);
        buf.freeze()
    }

    /// Reads a header from the front of `buf`, advancing it.
    pub fn read(buf: &mut impl Buf) -> anyhow::Result<Self> {
        if buf.remaining() < HEADER_LEN {
            bail!("entity header truncated: {} of {} bytes", buf.remaining(), HEADER_LEN);
        }
        let id = buf.get_u64();
        let code = buf.get_u8();
        let Some(ty) = EntityType::from_u8(code) else {
            bail!("unknown entity type code {code}");
        };
        Ok(Self { id, ty })
    }
}
