//! Local game state the commands read and change: difficulty and level loads.
//!
//! Scene loading itself belongs to the game; the host only records the
//! request in `pending_load` and reports it through `Host::on_level_loaded`
//! once the game is done.

use coop_shared::levels;

/// Difficulty names, indexed by difficulty value.
pub const DIFFICULTIES: [&str; 5] = ["Harmless", "Lenient", "Standard", "Violent", "Brutal"];

#[derive(Debug, Clone)]
pub struct GameState {
    difficulty: u8,
    scene: String,
    pending_load: Option<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            difficulty: 2,
            scene: levels::MAIN_MENU.to_string(),
            pending_load: None,
        }
    }
}

impl GameState {
    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    pub fn difficulty_name(&self) -> &'static str {
        DIFFICULTIES[self.difficulty as usize]
    }

    /// Takes effect after the next level restart.
    pub fn set_difficulty(&mut self, difficulty: u8) {
        self.difficulty = difficulty.min(DIFFICULTIES.len() as u8 - 1);
    }

    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn set_scene(&mut self, scene: &str) {
        self.scene = scene.to_string();
    }

    /// Asks the game to load a scene.
    pub fn request_load(&mut self, scene: &str) {
        tracing::info!(scene, "Level load requested");
        self.pending_load = Some(scene.to_string());
    }

    pub fn take_pending_load(&mut self) -> Option<String> {
        self.pending_load.take()
    }

    pub fn pending_load(&self) -> Option<&str> {
        self.pending_load.as_deref()
    }
}

/// Parses a difficulty given as a number or a name.
pub fn parse_difficulty(arg: &str) -> Option<u8> {
    if let Ok(value) = arg.parse::<u8>() {
        return ((value as usize) < DIFFICULTIES.len()).then_some(value);
    }
    DIFFICULTIES
        .iter()
        .position(|d| d.eq_ignore_ascii_case(arg))
        .map(|i| i as u8)
}

/// A level the `level` command resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelRequest {
    pub scene: String,
    /// What to tell the player.
    pub message: String,
}

impl LevelRequest {
    fn new(scene: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            message: message.into(),
        }
    }
}

/// Resolves `level` command arguments: `<layer> <level>`, `<layer>-<level>`,
/// `sandbox`, `cyber grind` or `museum`.
pub fn parse_level(args: &[&str]) -> Result<LevelRequest, &'static str> {
    let split: Vec<&str>;
    let args = match args {
        [single] if single.contains('-') => {
            split = single.split('-').collect();
            &split[..]
        }
        _ => args,
    };

    let first = args.first().map(|a| a.to_lowercase()).unwrap_or_default();
    if first == "sandbox" || first == "sand" {
        return Ok(LevelRequest::new("uk_construct", "Sandbox is loading."));
    }
    if first.contains("cyber") || first.contains("grind") || first == "cg" {
        return Ok(LevelRequest::new("Endless", "The Cyber Grind is loading."));
    }
    if first.contains("credits") || first == "museum" {
        return Ok(LevelRequest::new("CreditsMuseum2", "The Credits Museum is loading."));
    }

    let [layer, level, ..] = args else {
        return Err("Insufficient number of arguments.");
    };

    if let (Ok(layer), Ok(level)) = (layer.parse::<u8>(), level.parse::<u8>()) {
        let valid = layer <= 7
            && (1..=5).contains(&level)
            && (level != 5 || layer == 0)
            && (!(layer == 3 || layer == 6) || level <= 2);
        if valid {
            return Ok(LevelRequest::new(
                format!("Level {layer}-{level}"),
                format!("Level {layer}-{level} is loading."),
            ));
        }
    }

    if level.eq_ignore_ascii_case("s") {
        if let Ok(layer) = layer.parse::<u8>() {
            if layer <= 7 && layer != 3 && layer != 6 {
                return Ok(LevelRequest::new(
                    format!("Level {layer}-S"),
                    format!("Secret level {layer}-S is loading."),
                ));
            }
        }
    }

    if layer.eq_ignore_ascii_case("p") {
        if let Ok(level @ 1..=2) = level.parse::<u8>() {
            return Ok(LevelRequest::new(
                format!("Level P-{level}"),
                format!("Prime level P-{level} is loading."),
            ));
        }
    }

    Err("Layer must be an integer from 0 to 7. Level must be an integer from 1 to 5.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_by_number_or_name() {
        assert_eq!(parse_difficulty("0"), Some(0));
        assert_eq!(parse_difficulty("violent"), Some(3));
        assert_eq!(parse_difficulty("BRUTAL"), Some(4));
        assert_eq!(parse_difficulty("5"), None);
        assert_eq!(parse_difficulty("hard"), None);
    }

    #[test]
    fn campaign_levels() {
        assert_eq!(parse_level(&["1", "2"]).unwrap().scene, "Level 1-2");
        assert_eq!(parse_level(&["0-5"]).unwrap().scene, "Level 0-5");
        assert!(parse_level(&["1", "5"]).is_err());
        assert!(parse_level(&["3", "3"]).is_err());
        assert!(parse_level(&["8", "1"]).is_err());
    }

    #[test]
    fn secret_and_prime_levels() {
        assert_eq!(parse_level(&["4-S"]).unwrap().scene, "Level 4-S");
        assert!(parse_level(&["3", "s"]).is_err());
        assert_eq!(parse_level(&["P", "2"]).unwrap().scene, "Level P-2");
        assert!(parse_level(&["p", "3"]).is_err());
    }

    #[test]
    fn named_scenes() {
        assert_eq!(parse_level(&["sandbox"]).unwrap().scene, "uk_construct");
        assert_eq!(parse_level(&["cyber", "grind"]).unwrap().scene, "Endless");
        assert_eq!(parse_level(&["museum"]).unwrap().scene, "CreditsMuseum2");
    }

    #[test]
    fn missing_arguments() {
        assert_eq!(parse_level(&[]), Err("Insufficient number of arguments."));
        assert_eq!(parse_level(&["1"]), Err("Insufficient number of arguments."));
    }

    #[test]
    fn difficulty_is_clamped() {
        let mut game = GameState::default();
        assert_eq!(game.difficulty_name(), "Standard");
        game.set_difficulty(9);
        assert_eq!(game.difficulty(), 4);
    }
}
