//! Entity type taxonomy.
//!
//! Every replicated object carries an [`EntityType`] code. Codes are laid out in
//! contiguous half-open ranges, one per category:
//!
//! ```text
//! [0, ENEMY_OFFSET)              player
//! [ENEMY_OFFSET, ITEM_OFFSET)    enemies (security system parts at the tail)
//! [ITEM_OFFSET, PLUSHIE_OFFSET)  items
//! [PLUSHIE_OFFSET, BULLET_OFFSET) plushies
//! [BULLET_OFFSET, ..)            bullets, open-ended so new projectiles append
//! ```
//!
//! Classification never consults a table: every predicate is a couple of
//! integer comparisons against the offsets above. New codes must be appended
//! inside the range they belong to, which keeps the wire codes of older types
//! stable.

use serde::{Deserialize, Serialize};

/// All entity types. Will grow over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntityType {
    Player = 0,

    Filth = 1,
    Stray = 2,
    Schism = 3,
    Soldier = 4,
    TheCorpseOfKingMinos = 5,
    Stalker = 6,
    Insurrectionist = 7,
    Ferryman = 8,
    Swordsmachine = 9,
    Drone = 10,
    Streetcleaner = 11,
    Mindflayer = 12,
    V2RedArm = 13,
    V2GreenArm = 14,
    Sentry = 15,
    Gutterman = 16,
    Guttertank = 17,
    MaliciousFace = 18,
    Cerberus = 19,
    HideousMass = 20,
    Idol = 21,
    Mannequin = 22,
    Minotaur = 23,
    Virtue = 24,
    Gabriel = 25,
    GabrielAngry = 26,
    SomethingWicked = 27,
    FleshPrison = 28,
    FleshPrisonEye = 29,
    FleshPanopticon = 30,
    FleshPanopticonEye = 31,
    FleshPanopticonFace = 32,
    MinosPrime = 33,
    SisyphusPrime = 34,
    CancerousRodent = 35,
    VeryCancerousRodent = 36,
    Mandalore = 37,
    Johninator = 38,
    Puppet = 39,
    Hand = 40,
    Leviathan = 41,
    MinotaurChase = 42,
    SecuritySystemMain = 43,
    SecuritySystemRocketLauncher = 44,
    SecuritySystemRocketLauncherAlt = 45,
    SecuritySystemMortar = 46,
    SecuritySystemMortarAlt = 47,
    SecuritySystemTower = 48,
    SecuritySystemTowerAlt = 49,
    Brain = 50,

    // The two baits only hold their slots so skull ids stay aligned with older clients.
    AppleBait = 51,
    MauriceBait = 52,
    BlueSkull = 53,
    RedSkull = 54,
    Soap = 55,
    Torch = 56,
    Florp = 57,

    Hakita = 58,
    Pitr = 59,
    Victoria = 60,
    Heckteck = 61,
    CabalCrow = 62,
    Lucas = 63,
    Francis = 64,
    Jericho = 65,
    BigRock = 66,
    Mako = 67,
    Samuel = 68,
    Salad = 69,
    Meganeko = 70,
    Kgc = 71,
    Bj = 72,
    Jake = 73,
    John = 74,
    Quetzal = 75,
    Gianni = 76,
    Weyte = 77,
    Lenval = 78,
    Joy = 79,
    Mandy = 80,
    Cameron = 81,
    Dalia = 82,
    Tucker = 83,
    Scott = 84,
    Jacob = 85,
    Vvizard = 86,
    V1 = 87,

    Coin = 88,
    Rocket = 89,
    Ball = 90,
}

/// Coarse category of a type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Player,
    Enemy,
    Item,
    Plushie,
    Bullet,
}

use EntityType::*;

impl EntityType {
    pub const ENEMY_OFFSET: EntityType = Filth;
    pub const SECURITY_SYSTEM_OFFSET: EntityType = SecuritySystemMain;
    pub const ITEM_OFFSET: EntityType = AppleBait;
    pub const PLUSHIE_OFFSET: EntityType = Hakita;
    pub const BULLET_OFFSET: EntityType = Coin;

    /// Every declared type, indexed by its code.
    pub const ALL: [EntityType; 91] = [
        Player, Filth, Stray, Schism, Soldier, TheCorpseOfKingMinos, Stalker, Insurrectionist,
        Ferryman, Swordsmachine, Drone, Streetcleaner, Mindflayer, V2RedArm, V2GreenArm, Sentry,
        Gutterman, Guttertank, MaliciousFace, Cerberus, HideousMass, Idol, Mannequin, Minotaur,
        Virtue, Gabriel, GabrielAngry, SomethingWicked, FleshPrison, FleshPrisonEye,
        FleshPanopticon, FleshPanopticonEye, FleshPanopticonFace, MinosPrime, SisyphusPrime,
        CancerousRodent, VeryCancerousRodent, Mandalore, Johninator, Puppet, Hand, Leviathan,
        MinotaurChase, SecuritySystemMain, SecuritySystemRocketLauncher,
        SecuritySystemRocketLauncherAlt, SecuritySystemMortar, SecuritySystemMortarAlt,
        SecuritySystemTower, SecuritySystemTowerAlt, Brain, AppleBait, MauriceBait, BlueSkull,
        RedSkull, Soap, Torch, Florp, Hakita, Pitr, Victoria, Heckteck, CabalCrow, Lucas, Francis,
        Jericho, BigRock, Mako, Samuel, Salad, Meganeko, Kgc, Bj, Jake, John, Quetzal, Gianni,
        Weyte, Lenval, Joy, Mandy, Cameron, Dalia, Tucker, Scott, Jacob, Vvizard, V1, Coin, Rocket,
        Ball,
    ];

    /// Decodes a wire code. Unknown codes yield `None`.
    pub fn from_u8(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn is_player(self) -> bool {
        (self as u8) < Self::ENEMY_OFFSET as u8
    }

    pub const fn is_enemy(self) -> bool {
        self as u8 >= Self::ENEMY_OFFSET as u8 && (self as u8) < Self::ITEM_OFFSET as u8
    }

    /// A BIG enemy that can only be spawned in limited numbers.
    pub const fn is_big_enemy(self) -> bool {
        self as u8 >= FleshPrison as u8 && (self as u8) <= SisyphusPrime as u8
    }

    /// An enemy the sandbox arm may spawn freely.
    pub const fn is_common_enemy(self) -> bool {
        self.is_enemy()
            && (self as u8) < Hand as u8
            && !self.is_big_enemy()
            && !matches!(self, TheCorpseOfKingMinos | SomethingWicked)
    }

    /// An enemy that can be hit by a thrown coin.
    pub const fn is_targetable(self) -> bool {
        self.is_enemy() && !matches!(self, Idol | CancerousRodent)
    }

    pub const fn is_security_system(self) -> bool {
        self as u8 >= Self::SECURITY_SYSTEM_OFFSET as u8 && (self as u8) < Self::ITEM_OFFSET as u8
    }

    pub const fn is_item(self) -> bool {
        self as u8 >= Self::ITEM_OFFSET as u8 && (self as u8) < Self::PLUSHIE_OFFSET as u8
    }

    pub const fn is_plushie(self) -> bool {
        self as u8 >= Self::PLUSHIE_OFFSET as u8 && (self as u8) < Self::BULLET_OFFSET as u8
    }

    pub const fn is_bullet(self) -> bool {
        self as u8 >= Self::BULLET_OFFSET as u8
    }

    pub const fn category(self) -> Category {
        if self.is_player() {
            Category::Player
        } else if self.is_enemy() {
            Category::Enemy
        } else if self.is_item() {
            Category::Item
        } else if self.is_plushie() {
            Category::Plushie
        } else {
            Category::Bullet
        }
    }

    /// Classifies a raw code; `None` for codes outside the declared space.
    pub fn category_of(code: u8) -> Option<Category> {
        Self::from_u8(code).map(Self::category)
    }

    /// Number of plushies, used to bound `plushie`.
    pub const PLUSHIE_COUNT: usize = (Self::BULLET_OFFSET as u8 - Self::PLUSHIE_OFFSET as u8) as usize;

    /// The plushie at `index` within the plushie range.
    pub fn plushie(index: usize) -> Option<Self> {
        if index >= Self::PLUSHIE_COUNT {
            return None;
        }
        Self::from_u8(Self::PLUSHIE_OFFSET as u8 + index as u8)
    }

    /// Display name, identical to the variant name.
    pub fn name(self) -> String {
        format!("{self:?}")
    }

    /// Case-insensitive exact lookup by name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::ALL.iter().copied().find(|t| t.name().to_lowercase() == name)
    }

    /// First plushie whose name contains `query`, ignoring case.
    pub fn find_plushie(query: &str) -> Option<Self> {
        let query = query.to_lowercase();
        (0..Self::PLUSHIE_COUNT)
            .filter_map(Self::plushie)
            .find(|t| t.name().to_lowercase().contains(&query))
    }
}

/// Whether the offsets are strictly increasing and the last declared code sits in the open range.
pub const fn ranges_are_ordered() -> bool {
    let offsets = [
        Player as u8,
        EntityType::ENEMY_OFFSET as u8,
        EntityType::SECURITY_SYSTEM_OFFSET as u8,
        EntityType::ITEM_OFFSET as u8,
        EntityType::PLUSHIE_OFFSET as u8,
        EntityType::BULLET_OFFSET as u8,
    ];
    let mut i = 1;
    while i < offsets.len() {
        if offsets[i - 1] >= offsets[i] {
            return false;
        }
        i += 1;
    }
    (EntityType::ALL.len() - 1) as u8 >= EntityType::BULLET_OFFSET as u8
}

const _: () = assert!(ranges_are_ordered());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_indexed_by_code() {
        for (i, ty) in EntityType::ALL.iter().enumerate() {
            assert_eq!(ty.code() as usize, i, "{ty:?} is out of place");
        }
    }

    #[test]
    fn unknown_code_matches_nothing() {
        assert_eq!(EntityType::from_u8(91), None);
        assert_eq!(EntityType::from_u8(255), None);
        assert_eq!(EntityType::category_of(200), None);
    }

    // =============================================================================
    // Range partition
    // =============================================================================

    #[test]
    fn every_code_has_exactly_one_category() {
        for ty in EntityType::ALL {
            let hits = [ty.is_player(), ty.is_enemy(), ty.is_item(), ty.is_plushie(), ty.is_bullet()]
                .iter()
                .filter(|&&b| b)
                .count();
            assert_eq!(hits, 1, "{ty:?} matched {hits} categories");
        }
    }

    #[test]
    fn boundaries_belong_to_their_own_range() {
        assert!(EntityType::ENEMY_OFFSET.is_enemy());
        assert!(EntityType::ITEM_OFFSET.is_item());
        assert!(!EntityType::ITEM_OFFSET.is_enemy());
        assert!(EntityType::PLUSHIE_OFFSET.is_plushie());
        assert!(!EntityType::PLUSHIE_OFFSET.is_item());
        assert!(EntityType::BULLET_OFFSET.is_bullet());
        assert!(!EntityType::BULLET_OFFSET.is_plushie());
        assert!(Brain.is_enemy());
        assert!(V1.is_plushie());
        assert!(Ball.is_bullet());
    }

    #[test]
    fn ranges_are_contiguous() {
        assert!(ranges_are_ordered());
        let mut last = Category::Player;
        let mut transitions = 0;
        for ty in EntityType::ALL {
            if ty.category() != last {
                transitions += 1;
                last = ty.category();
            }
        }
        // player -> enemy -> item -> plushie -> bullet, each seen once
        assert_eq!(transitions, 4);
    }

    #[test]
    fn items_are_never_enemies() {
        for ty in EntityType::ALL.iter().filter(|t| t.is_item()) {
            assert!(!ty.is_enemy());
            assert!(!ty.is_targetable());
        }
    }

    // =============================================================================
    // Enemy sub-classes
    // =============================================================================

    #[test]
    fn common_and_big_enemies_are_exclusive() {
        for ty in EntityType::ALL {
            assert!(!(ty.is_common_enemy() && ty.is_big_enemy()), "{ty:?}");
        }
        assert!(Filth.is_common_enemy());
        assert!(FleshPrison.is_big_enemy());
        assert!(SisyphusPrime.is_big_enemy());
        assert!(!CancerousRodent.is_big_enemy());
    }

    #[test]
    fn bosses_are_not_common() {
        assert!(!TheCorpseOfKingMinos.is_common_enemy());
        assert!(!SomethingWicked.is_common_enemy());
        assert!(!Hand.is_common_enemy());
        assert!(!Leviathan.is_common_enemy());
        assert!(Puppet.is_common_enemy());
    }

    #[test]
    fn coin_immune_enemies() {
        assert!(!Idol.is_targetable());
        assert!(!CancerousRodent.is_targetable());
        assert!(VeryCancerousRodent.is_targetable());
        assert!(!Player.is_targetable());
    }

    #[test]
    fn security_system_sits_at_enemy_tail() {
        assert!(SecuritySystemTowerAlt.is_security_system());
        assert!(SecuritySystemMain.is_enemy());
        assert!(!MinotaurChase.is_security_system());
        assert!(!AppleBait.is_security_system());
    }

    // =============================================================================
    // Names
    // =============================================================================

    #[test]
    fn plushie_lookup() {
        assert_eq!(EntityType::PLUSHIE_COUNT, 30);
        assert_eq!(EntityType::plushie(0), Some(Hakita));
        assert_eq!(EntityType::plushie(29), Some(V1));
        assert_eq!(EntityType::plushie(30), None);
        assert_eq!(EntityType::find_plushie("CROW"), Some(CabalCrow));
        assert_eq!(EntityType::find_plushie("nobody"), None);
    }

    #[test]
    fn name_lookup_ignores_case() {
        assert_eq!(EntityType::from_name("filth"), Some(Filth));
        assert_eq!(EntityType::from_name("MinosPrime"), Some(MinosPrime));
        assert_eq!(EntityType::from_name("minos"), None);
    }
}
