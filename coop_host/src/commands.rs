//! Gameplay chat commands.

use coop_shared::chat::{colored, Feedback, GREEN, MESSAGES_SHOWN, ORANGE, RED};
use coop_shared::commands::Commands;
use coop_shared::entity_type::EntityType;
use coop_shared::session::{encode_flag, LobbyRules};

use crate::game::{self, DIFFICULTIES};
use crate::host::Context;

/// Dev plushies grouped by role, as listed by `/plushies`.
const PLUSHIE_GROUPS: [(&str, &str); 8] = [
    ("Leading developers", "Hakita, Pitr, Victoria"),
    ("Programmers", "Heckteck, CabalCrow, Lucas"),
    ("Artists", "Francis, Jericho, BigRock, Mako, Samuel, Salad"),
    ("Composers", "Meganeko, KGC, BJ, Jake, John, Quetzal"),
    ("Voice actors", "Gianni, Weyte, Lenval, Joy, Mandy"),
    ("Quality assurance", "Cameron, Dalia, Tucker, Scott"),
    ("Other", "Jacob, Vvizard"),
    ("Machines", "V1, V2, V3, xzxADIxzx, Sowler"),
];

const AUTHORS: [&str; 13] = [
    "Leading developers:",
    "* [#0096FF]xzxADIxzx[] - the main developer of this mod",
    "* [#8A2BE2]Sowler[] - owner of the Discord server and just a good friend",
    "* [#FFA000]Fumboy[] - textures and a part of animations",
    "Contributors:",
    "* [#00E666]Rey Hunter[] - really cool icons for emotions",
    "* [#00E666]Ardub[] - invaluable help with The Cyber Grind [12][#cccccc](he did 90% of the work)",
    "* [#00E666]Kekson1a[] - Steam Rich Presence support",
    "Translators:",
    "[#cccccc]NotPhobos - Spanish, sSAR - Italian, Theoyeah - French, Sowler - Polish,",
    "[#cccccc]Ukrainian, Poyozit - Portuguese, Fraku - Filipino, Iyad - Arabic",
    "Testers:",
    "[#cccccc]Fenicemaster, AndruGhost, Subjune, FruitCircuit",
];

fn msg(ctx: &mut Context, text: &str) {
    ctx.receive(&format!("[14]{text}[]"));
}

/// Registers every gameplay command.
pub fn register_all(commands: &mut Commands<Context>) {
    commands.register("hello", None, "Resend the tips for new players", |_, ctx| {
        hello(ctx);
    });

    commands.register(
        "level",
        Some("<layer> <level> / sandbox / cyber grind / museum"),
        "Load a level",
        |args, ctx| match game::parse_level(args) {
            Ok(request) => {
                ctx.game.request_load(&request.scene);
                ctx.receive(&colored(GREEN, &request.message));
            }
            Err(error) => ctx.receive(&colored(RED, error)),
        },
    );

    commands.register(
        "difficulty",
        Some("<value>(optional)"),
        "Set/Get the difficulty (Applies after level restart)",
        difficulty,
    );

    commands.register("plushies", None, "Display the list of all dev plushies", |_, ctx| {
        for (i, (role, devs)) in PLUSHIE_GROUPS.iter().enumerate() {
            let gap = if i + 1 == PLUSHIE_GROUPS.len() { "" } else { "\n" };
            msg(ctx, &format!("{role}:\n{devs}{gap}"));
        }
    });

    commands.register("plushie", Some("<name>"), "Spawn a plushie by name", |args, ctx| {
        let Some(name) = args.first() else {
            ctx.receive(&colored(RED, "Enter the name of a plushie."));
            return;
        };
        match EntityType::find_plushie(name) {
            Some(ty) => spawn(ctx, ty),
            None => ctx.receive(&colored(RED, &format!("Plushie named {name} not found."))),
        }
    });

    commands.register("spawn", Some("<enemy>"), "Spawn a common enemy by name", |args, ctx| {
        let Some(name) = args.first() else {
            ctx.receive(&colored(RED, "Enter the name of an enemy."));
            return;
        };
        let session = &ctx.session;
        if session.is_online() && !session.is_owner() && !session.cheats_allowed() {
            ctx.receive(&colored(RED, "Cheats are disabled in this lobby."));
            return;
        }
        match EntityType::from_name(name) {
            Some(ty) if ty.is_common_enemy() => spawn(ctx, ty),
            Some(ty) => ctx.receive(&colored(RED, &format!("{} can't be spawned.", ty.name()))),
            None => ctx.receive(&colored(RED, &format!("Enemy named {name} not found."))),
        }
    });

    commands.register("authors", None, "Display the list of the mod developers", |_, ctx| {
        for line in AUTHORS {
            msg(ctx, line);
        }
        let author = colored("#0096FF", "xzxADIxzx");
        ctx.receive(&format!("{author}: Thank you all, I couldn't have done it alone ♡"));
    });

    commands.register("uiddump", None, "Dump all user IDs", |_, ctx| {
        let local = ctx.session.local_peer();
        let mut peers = vec![local];
        peers.extend(ctx.session.members().iter().copied().filter(|p| *p != local));

        for peer in peers {
            let name = ctx.peer_name(peer);
            tracing::debug!(%peer, %name, "UID dump");
            msg(ctx, &format!("\\[UID Dump\\] {} :: \"{name}\"", peer.account_id()));
        }
    });

    commands.register("clear", None, "Clear chat", |_, ctx| {
        for _ in 0..MESSAGES_SHOWN {
            ctx.receive("\\");
        }
    });

    commands.register(
        "rule",
        Some("<pvp/cheats/mods/heal-bosses> [on/off]"),
        "Show or change a lobby rule",
        rule,
    );
}

fn hello(ctx: &mut Context) {
    msg(ctx, "Welcome! Here are some tips:");
    msg(ctx, "* Type /help to see every command.");
    msg(ctx, "* Share the lobby code with your friends so they can join.");
    if let Some(code) = ctx.session.code() {
        msg(ctx, &format!("* Your lobby code is [{ORANGE}]{code}[]."));
    }
}

fn spawn(ctx: &mut Context, ty: EntityType) {
    match ctx.spawn(ty) {
        Some(id) => ctx.receive(&colored(GREEN, &format!("Spawned {} #{id}.", ty.name()))),
        None => ctx.receive(&colored(RED, &format!("{} can't be spawned here.", ty.name()))),
    }
}

fn difficulty(args: &[&str], ctx: &mut Context) {
    match args {
        [] => {
            let current = ctx.game.difficulty_name();
            msg(ctx, &format!("\\[Difficulty\\] Current difficulty: {current}"));
        }
        [value] => {
            if !ctx.session.is_owner() {
                msg(ctx, "\\[Difficulty\\] Only the lobby owner can change difficulties");
                return;
            }
            match game::parse_difficulty(value) {
                Some(difficulty) => {
                    ctx.game.set_difficulty(difficulty);
                    msg(
                        ctx,
                        &format!(
                            "\\[Difficulty\\] Set difficulty to {}",
                            DIFFICULTIES[difficulty as usize]
                        ),
                    );
                }
                None => msg(
                    ctx,
                    "\\[Difficulty\\] Must be a number from 0 to 4 or a valid difficulty name",
                ),
            }
        }
        _ => msg(
            ctx,
            "\\[Difficulty\\] Enter no arguments to get the difficulty, enter one argument to set the difficulty",
        ),
    }
}

fn rule(args: &[&str], ctx: &mut Context) {
    let Some(key) = args.first() else {
        let rules = ctx.session.rules();
        for (rule, key) in LobbyRules::KEYS {
            msg(ctx, &format!("{key}: {}", on_off(rules.contains(rule))));
        }
        return;
    };
    let Some(rule) = LobbyRules::from_key(key) else {
        ctx.receive(&colored(RED, &format!("Unknown rule {key}.")));
        return;
    };

    let Some(value) = args.get(1) else {
        let on = ctx.session.rules().contains(rule);
        msg(ctx, &format!("{key}: {}", on_off(on)));
        return;
    };
    let on = match *value {
        "on" => true,
        "off" => false,
        _ => {
            ctx.receive(&colored(RED, "The value must be on or off."));
            return;
        }
    };

    if ctx.session.set_rule(rule, on) {
        tracing::info!(rule = *key, value = encode_flag(on), "Lobby rule changed");
        ctx.receive(&colored(GREEN, &format!("{key} is now {}.", on_off(on))));
    } else {
        ctx.receive(&colored(RED, "Only the lobby owner can change rules."));
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use coop_shared::config::HostConfig;
    use coop_shared::peer_id::PeerId;

    use crate::host::Host;
    use crate::loopback::LoopbackNetwork;

    fn host() -> Host {
        let network = LoopbackNetwork::new();
        Host::loopback(HostConfig::default(), &network, PeerId::from_account_id(7)).unwrap()
    }

    async fn online_host(network: &Arc<LoopbackNetwork>) -> Host {
        let mut host =
            Host::loopback(HostConfig::default(), network, PeerId::from_account_id(7)).unwrap();
        host.create_lobby();
        host.settle().await;
        host
    }

    // =============================================================================
    // Dispatch
    // =============================================================================

    #[tokio::test]
    async fn help_lists_gameplay_commands() {
        let mut host = host();
        assert!(host.submit("/help"));

        let lines: Vec<&str> = host.chat().lines().collect();
        assert!(lines[0].starts_with("[14]/help"));
        assert!(host.commands().contains("plushie"));
        assert!(host.commands().contains("rule"));
    }

    #[tokio::test]
    async fn unknown_command_is_not_handled() {
        let mut host = host();
        assert!(!host.submit("/doesnotexist"));
        assert!(host.chat().is_empty());
    }

    // =============================================================================
    // Level & difficulty
    // =============================================================================

    #[tokio::test]
    async fn level_requests_a_load() {
        let mut host = host();
        host.submit("/level 4-S");
        assert_eq!(host.game().pending_load(), Some("Level 4-S"));
        assert_eq!(host.chat().last(), Some("[#32CD32]Secret level 4-S is loading.[]"));

        host.submit("/level 9 9");
        assert!(host.chat().last().unwrap().starts_with("[#FF341C]Layer must be"));
    }

    #[tokio::test]
    async fn difficulty_needs_ownership() {
        let mut host = host();
        host.submit("/difficulty");
        assert_eq!(
            host.chat().last(),
            Some("[14]\\[Difficulty\\] Current difficulty: Standard[]")
        );

        host.submit("/difficulty brutal");
        assert_eq!(host.game().difficulty(), 2);

        let network = LoopbackNetwork::new();
        let mut owner = online_host(&network).await;
        owner.submit("/difficulty brutal");
        assert_eq!(owner.game().difficulty(), 4);
    }

    // =============================================================================
    // Spawning
    // =============================================================================

    #[tokio::test]
    async fn plushie_spawns_with_next_id() {
        let network = LoopbackNetwork::new();
        let mut host = online_host(&network).await;

        host.submit("/plushie hakita");
        assert_eq!(host.chat().last(), Some("[#32CD32]Spawned Hakita #1.[]"));
        host.submit("/plushie nobody");
        assert_eq!(host.chat().last(), Some("[#FF341C]Plushie named nobody not found.[]"));
        assert_eq!(host.context().spawned.len(), 1);
    }

    #[tokio::test]
    async fn spawn_accepts_common_enemies_only() {
        let mut host = host();
        host.submit("/spawn filth");
        assert_eq!(host.context().spawned.len(), 1);

        host.submit("/spawn minosprime");
        assert_eq!(host.chat().last(), Some("[#FF341C]MinosPrime can't be spawned.[]"));
        assert_eq!(host.context().spawned.len(), 1);
    }

    // =============================================================================
    // Rules
    // =============================================================================

    #[tokio::test]
    async fn owner_changes_rules() {
        let network = LoopbackNetwork::new();
        let mut host = online_host(&network).await;
        let lobby = host.session().lobby_id().unwrap();

        host.submit("/rule pvp off");
        assert!(!host.session().pvp_allowed());
        assert_eq!(network.lobby(lobby).unwrap().get_data("pvp"), Some("False"));

        host.submit("/rule pvp");
        assert_eq!(host.chat().last(), Some("[14]pvp: off[]"));
    }

    #[tokio::test]
    async fn offline_rule_change_is_refused() {
        let mut host = host();
        host.submit("/rule cheats on");
        assert_eq!(
            host.chat().last(),
            Some("[#FF341C]Only the lobby owner can change rules.[]")
        );
    }

    #[tokio::test]
    async fn plushies_print_role_blocks() {
        let mut host = host();
        host.submit("/plushies");

        let lines: Vec<&str> = host.chat().lines().collect();
        assert_eq!(lines[0], "[14]Leading developers:\nHakita, Pitr, Victoria\n[]");
        assert_eq!(lines[7], "[14]Machines:\nV1, V2, V3, xzxADIxzx, Sowler[]");
    }

    #[tokio::test]
    async fn authors_only_print() {
        let mut host = host();
        assert!(host.submit("/authors"));

        assert_eq!(host.chat().lines().next(), Some("[14]Leading developers:[]"));
        assert!(host.chat().last().unwrap().ends_with("couldn't have done it alone ♡"));
        assert!(host.session().is_offline());
    }

    #[tokio::test]
    async fn clear_pushes_blank_lines() {
        let mut host = host();
        host.submit("/hello");
        host.submit("/clear");
        assert!(host.chat().lines().all(|l| l == "\\"));
    }
}
