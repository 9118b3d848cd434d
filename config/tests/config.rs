use std::{path::PathBuf, time::Duration};

use path_defence_config::{
    load_game, load_stage, parse_game, parse_stage, ConfigError, DEFAULT_SPAWN_INTERVAL,
};
use path_defence_core::{
    AttackMode, CellCoord, Currency, EnemyKind, SpawnOrder, TargetPriority, TowerKind, WaveNumber,
};

fn asset(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../assets")
        .join(relative)
}

#[test]
fn bundled_assets_load() {
    let game = load_game(asset("game.toml")).expect("bundled game document loads");
    let stage = load_stage(asset("stages/meadow.toml")).expect("bundled stage loads");

    assert_eq!(stage.name, "Meadow");
    assert_eq!(stage.waves.len(), 3);
    assert_eq!(stage.grid_size(), 64.0);
    assert_eq!(
        game.settings.starting_balances,
        vec![(Currency::gold(), 120)]
    );

    let tnt = game
        .towers
        .get(&TowerKind::new("tnt"))
        .expect("tnt is defined");
    assert_eq!(tnt.attack_mode, AttackMode::SingleTarget);
    assert_eq!(tnt.priority, TargetPriority::HighestHealth);
    assert!(tnt.levels[0].blast.is_some(), "AOE towers carry a blast");

    for (kind, count) in stage
        .waves
        .get(WaveNumber::new(2))
        .map(|wave| wave.enemies.clone())
        .unwrap_or_default()
    {
        assert!(game.enemies.contains(&kind), "stage references unknown {kind}");
        assert!(count > 0);
    }
}

#[test]
fn omitted_fields_take_defaults() {
    let game = parse_game(
        r#"
        [enemies.blob]

        [towers.arrow]
        [[towers.arrow.levels]]
        speed = 1.0
        range = 2.0
        "#,
    )
    .expect("minimal game document");

    let blob = game
        .enemies
        .get(&EnemyKind::new("blob"))
        .expect("blob is defined");
    assert_eq!(blob.health, 100);
    assert_eq!(blob.speed, 100.0);
    assert_eq!(blob.damage, 10);
    assert_eq!(blob.reward, 0);

    assert_eq!(game.settings.player_health, 100);
    assert_eq!(game.settings.wave_delay, Duration::from_secs(3));
    assert_eq!(game.settings.sell_refund_percent, 50);
    assert_eq!(game.settings.spawn_order, SpawnOrder::Sequential);

    let arrow = game
        .towers
        .get(&TowerKind::new("arrow"))
        .expect("arrow is defined");
    assert_eq!(arrow.attack_mode, AttackMode::SingleTarget);
    assert_eq!(arrow.priority, TargetPriority::First);
    assert_eq!(arrow.levels[0].cooldown, Duration::from_secs(1));
}

#[test]
fn debuff_keys_map_onto_the_level_table() {
    let game = parse_game(
        r#"
        [towers.frost]
        attack_type = "around"
        image = "frost.png"
        [[towers.frost.levels]]
        damage = 3
        speed = 0.5
        range = 1.5
        cost = 30
        slow_percent = 40.0
        slow_duration = 1.5
        burning_damage = 2
        burning_duration = 3.0
        add_gold_amount = 1
        [[towers.frost.levels]]
        speed = 0.5
        range = 2.0
        image = "frost_2.png"
        "#,
    )
    .expect("frost document");

    let frost = game
        .towers
        .get(&TowerKind::new("frost"))
        .expect("frost is defined");
    assert_eq!(frost.attack_mode, AttackMode::Area);

    let first = &frost.levels[0];
    let slow = first.debuffs.slow.expect("slow configured");
    assert!((slow.fraction - 0.4).abs() < 1e-6);
    assert_eq!(slow.duration, Duration::from_millis(1_500));
    assert_eq!(first.debuffs.burning.map(|dot| dot.damage), Some(2));
    assert_eq!(first.debuffs.bleeding, None);
    assert_eq!(first.debuffs.gold_on_hit, Some(1));
    assert_eq!(first.image.as_deref(), Some("frost.png"));
    assert_eq!(frost.levels[1].image.as_deref(), Some("frost_2.png"));
}

#[test]
fn max_level_caps_the_authored_levels() {
    let game = parse_game(
        r#"
        [towers.arrow]
        max_level = 1
        [[towers.arrow.levels]]
        speed = 1.0
        range = 2.0
        [[towers.arrow.levels]]
        speed = 0.5
        range = 3.0
        "#,
    )
    .expect("capped tower");
    let arrow = game
        .towers
        .get(&TowerKind::new("arrow"))
        .expect("arrow is defined");
    assert_eq!(arrow.max_level(), 1);

    let error = parse_game(
        r#"
        [towers.arrow]
        max_level = 3
        [[towers.arrow.levels]]
        speed = 1.0
        range = 2.0
        "#,
    )
    .expect_err("max_level beyond the authored levels");
    assert!(matches!(error, ConfigError::Tower { ref kind, .. } if kind == "arrow"));
}

#[test]
fn out_of_range_values_are_rejected() {
    let cases = [
        ("[enemies.blob]\nhealth = 0", "zero health"),
        ("[enemies.blob]\nspeed = -2.0", "negative speed"),
        ("[settings]\nsell_refund_percent = 150", "refund over 100%"),
        (
            "[towers.t]\n[[towers.t.levels]]\nspeed = 1.0\nrange = 1.0\nslow_percent = 120.0\nslow_duration = 1.0",
            "slow over 100%",
        ),
        (
            "[towers.t]\n[[towers.t.levels]]\nspeed = 0.0\nrange = 1.0",
            "zero cooldown",
        ),
        (
            "[towers.t]\nattack_type = \"laser\"\n[[towers.t.levels]]\nspeed = 1.0\nrange = 1.0",
            "unknown attack type",
        ),
        (
            "[towers.t]\nattack_type = \"around\"\n[[towers.t.levels]]\nspeed = 1.0\nrange = 1.0\nblast_radius = 1.0\nblast_damage = 5",
            "blast on an area tower",
        ),
        ("[enemies.blob]\narmor = 3", "unknown key"),
    ];

    for (source, label) in cases {
        assert!(parse_game(source).is_err(), "{label} was accepted");
    }
}

#[test]
fn stage_parsing_validates_layout_and_waves() {
    let stage = parse_stage(
        r#"
        columns = 6
        rows = 4
        grid_size = 32.0
        walk_path = ["0,1", "2,3"]

        [waves.1]
        enemies = { blob = 2 }
        "#,
        "fallback",
    )
    .expect("valid stage");

    assert_eq!(stage.name, "fallback");
    assert_eq!(
        stage.path.waypoints(),
        [
            CellCoord::new(0, 1),
            CellCoord::new(2, 1),
            CellCoord::new(2, 3)
        ]
    );
    let wave = stage
        .waves
        .get(WaveNumber::new(1))
        .expect("wave one is defined");
    assert_eq!(wave.spawn_interval, DEFAULT_SPAWN_INTERVAL);

    let short = parse_stage("columns = 6\nrows = 4\nwalk_path = [\"1,1\"]", "short");
    assert!(matches!(short, Err(ConfigError::Path { .. })));

    let zero_rate = parse_stage(
        "columns = 6\nrows = 4\nwalk_path = [\"0,0\", \"3,0\"]\n[waves.1]\nspawn_rate = 0.0",
        "zero",
    );
    let zero_rate = zero_rate.expect("a zero spawn rate falls back");
    assert_eq!(
        zero_rate
            .waves
            .get(WaveNumber::new(1))
            .map(|wave| wave.spawn_interval),
        Some(DEFAULT_SPAWN_INTERVAL)
    );

    let no_rows = parse_stage("columns = 6\nrows = 0\nwalk_path = [\"0,0\", \"3,0\"]", "flat");
    assert!(matches!(no_rows, Err(ConfigError::Stage { .. })));
}

#[test]
fn fractional_enemy_counts_are_skipped() {
    let stage = parse_stage(
        r#"
        columns = 10
        rows = 6
        walk_path = ["0,2", "9,2"]

        [waves.1]
        spawn_rate = 0.25
        enemies = { grunt = 2, ghoul = 1.5 }
        "#,
        "mixed",
    )
    .expect("a fractional count does not fail the stage");

    let wave = stage
        .waves
        .get(WaveNumber::new(1))
        .expect("wave one is defined");
    assert_eq!(wave.spawn_interval, Duration::from_millis(250));
    assert_eq!(wave.enemies, vec![(EnemyKind::new("grunt"), 2)]);
}

#[test]
fn missing_files_report_their_path() {
    let error = load_game(asset("does-not-exist.toml")).expect_err("missing file");
    match error {
        ConfigError::Io { path, .. } => assert!(path.ends_with("does-not-exist.toml")),
        other => panic!("unexpected error: {other}"),
    }
}
