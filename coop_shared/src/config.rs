//! Configuration system.
//!
//! Loads host configuration from JSON strings (file IO left to the app).

use serde::{Deserialize, Serialize};

use crate::session::{LobbyRules, SessionSettings};

/// Root configuration of a host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Local player name, used for the default lobby name.
    #[serde(default = "default_player_name")]
    pub player_name: String,
    /// Rate of the host update loop.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
    /// Member limit requested when creating a lobby.
    #[serde(default = "default_max_members")]
    pub max_members: u8,
    /// Lobby data key that marks lobbies created by this application.
    #[serde(default = "default_marker_key")]
    pub marker_key: String,
    /// Lobby data keys of incompatible builds; such lobbies are left on entry.
    #[serde(default = "default_foreign_marker_keys")]
    pub foreign_marker_keys: Vec<String>,
    /// Fraction of boss health added per extra player.
    #[serde(default = "default_boss_health_per_player")]
    pub boss_health_per_player: f32,
    /// Rules a freshly created lobby starts with.
    #[serde(default)]
    pub rules: RulesConfig,
}

/// Default lobby rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    pub pvp: bool,
    pub cheats: bool,
    pub mods: bool,
    pub heal_bosses: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            pvp: true,
            cheats: false,
            mods: true,
            heal_bosses: true,
        }
    }
}

impl RulesConfig {
    pub fn to_rules(&self) -> LobbyRules {
        let mut rules = LobbyRules::empty();
        rules.set(LobbyRules::PVP, self.pvp);
        rules.set(LobbyRules::CHEATS, self.cheats);
        rules.set(LobbyRules::MODS, self.mods);
        rules.set(LobbyRules::HEAL_BOSSES, self.heal_bosses);
        rules
    }
}

fn default_player_name() -> String {
    "Player".to_string()
}

fn default_tick_hz() -> u32 {
    60
}

fn default_max_members() -> u8 {
    u8::MAX
}

fn default_marker_key() -> String {
    "coop".to_string()
}

fn default_foreign_marker_keys() -> Vec<String> {
    vec!["mk_lobby".to_string()]
}

fn default_boss_health_per_player() -> f32 {
    0.25
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            player_name: default_player_name(),
            tick_hz: default_tick_hz(),
            max_members: default_max_members(),
            marker_key: default_marker_key(),
            foreign_marker_keys: default_foreign_marker_keys(),
            boss_health_per_player: default_boss_health_per_player(),
            rules: RulesConfig::default(),
        }
    }
}

impl HostConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// The part of the config the session state machine needs.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            lobby_name: format!("{}'s Lobby", self.player_name),
            marker_key: self.marker_key.clone(),
            foreign_marker_keys: self.foreign_marker_keys.clone(),
            default_rules: self.rules.to_rules(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let cfg = HostConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg.player_name, "Player");
        assert_eq!(cfg.max_members, 255);
        assert_eq!(cfg.marker_key, "coop");
        assert!(cfg.rules.pvp);
        assert!(!cfg.rules.cheats);
    }

    #[test]
    fn partial_json_overrides() {
        let cfg = HostConfig::from_json_str(
            r#"{ "player_name": "V1", "rules": { "pvp": false, "cheats": true, "mods": true, "heal_bosses": false } }"#,
        )
        .unwrap();
        let settings = cfg.session_settings();
        assert_eq!(settings.lobby_name, "V1's Lobby");
        assert_eq!(settings.default_rules, LobbyRules::CHEATS | LobbyRules::MODS);
    }
}
