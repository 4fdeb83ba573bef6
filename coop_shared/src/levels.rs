//! Scene names → labels shown in the public lobby list.

/// Maps a scene name to something an average player understands.
///
/// Campaign scenes are named `Level X-Y`; the prefix is dropped. Unknown
/// scenes without the prefix are shown as-is.
pub fn display_name(scene: &str) -> &str {
    match scene {
        "Tutorial" => "Tutorial",
        "uk_construct" => "Sandbox",
        "Endless" => "Cyber Grind",
        "CreditsMuseum2" => "Museum",
        "Intermission1" | "Intermission2" => "Intermission",
        "Level 4-S" => "Myth",
        "Main Menu" => "Main Menu",

        // custom levels
        "UltrabusLmao" => "Ultrabus",
        "remphase.hydraxous.rubicon.first" => "Rubicon-1",
        "remphase.hydraxous.rubicon.second" => "Rubicon-2",
        "RaifuLostFieldsenvyb" => "Envy-1",
        "raifuenvypalaceforbundle" => "Envy-2",
        "RaifuCastleManiacTheReal" => "Envy-3",
        "RaifuEveryStarInTheSkyReal" => "Envy-4",
        "mag.indulgence.thedeathofparadigm" => "Indulgence-1",
        "frizou.paradiso.moonFirst" => "Paridiso 1-1",
        "QoDaX.BargainingFirst" => "Bargaining-1",
        "QoDaX.AcceptanceFirst" => "Acceptance-1",
        "pkpseudo-nonamestreets" => "WTSHNN",
        "SSSoap:PX-0-1" => "PreludeXtreme-1",
        "SSSoap:PX-0-2" => "PreludeXtreme-2",
        "brushtromein-7-1-1" => "V. Encore 7-1-1",
        "brushtromein-7-3-1-new" => "V. Encore 7-3-1",
        "megacheb.tasb" => "MegaFraud",
        "Spelunky.FRAUDULENCE_FIRST" => "Fraudulence-1",
        "Spelunky.FRAUDULENCE_SECOND" => "Fraudulence-2",
        "82.Fraud.HigherTTBS" => "Fraud HTTBS",
        "fruitc.finale" => "Finale-1",
        "fruic.finale2" => "Finale-2",
        "fruitc.finale2b" => "Finale-2B",
        "chebm.essentials" => "Cheb Museum",
        "ceo_of_gaming.overworld.1" => "Minecraft O-1",
        "ceo_of_gaming.overworld.2" => "Minecraft O-2",
        "ceo_of_gaming.minecraft.nether" => "Minecraft N-1",
        "willem1321.cultofdopefish" => "CultOfDopefish",
        "Rude.Jam.cool.level" => "TheCyberGrind?",
        "riko.uk.bloodytears" => "Bloody Tears",
        "TheWeightOfTheWorldWrath.Gerigrape9" => "Pandemonium",
        "willem1321-ukflatgrass2" => "uk_flatgrass2",
        "t.trinity.v3" => "V3's Showdown",
        "willem1321-epitaph" => "Epitaph",
        "willem1321.theskilltest" => "SkillTest 1",
        "willem1321-skilltest2" => "SkillTest 2",
        "willem1321-premonitions" => "SkillTest 2.5",

        other => other.strip_prefix("Level ").unwrap_or(other),
    }
}

/// Scene name loaded when the player returns to the menu.
pub const MAIN_MENU: &str = "Main Menu";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_levels_drop_prefix() {
        assert_eq!(display_name("Level 0-1"), "0-1");
        assert_eq!(display_name("Level P-2"), "P-2");
    }

    #[test]
    fn special_scenes() {
        assert_eq!(display_name("uk_construct"), "Sandbox");
        assert_eq!(display_name("Endless"), "Cyber Grind");
        assert_eq!(display_name("Level 4-S"), "Myth");
    }

    #[test]
    fn custom_levels_have_short_labels() {
        assert_eq!(display_name("RaifuCastleManiacTheReal"), "Envy-3");
        assert_eq!(display_name("fruic.finale2"), "Finale-2");
        assert_eq!(display_name("ceo_of_gaming.minecraft.nether"), "Minecraft N-1");
        assert_eq!(display_name("willem1321-premonitions"), "SkillTest 2.5");
    }

    #[test]
    fn unknown_scene_passes_through() {
        assert_eq!(display_name("Lvl"), "Lvl");
    }
}
