use std::sync::Arc;

use anyhow::Result;
use pretty_assertions::assert_eq;

use openfixture::parse::{parse_fixture, ParsedFixture};
use openfixture::problems::Problem;
use openfixture::validate::validate;
use openfixture::{
    CapabilityKind, ChannelId, ChannelRef, Key, Manufacturer, Resolution,
};

fn key(s: &str) -> Key {
    s.parse().unwrap()
}

fn acme() -> Arc<Manufacturer> {
    Arc::new(Manufacturer {
        key: key("acme"),
        name: "Acme".into(),
        website: Some("https://acme.example".into()),
        comment: None,
        rdm_id: Some(0x2911),
    })
}

const MOVING_HEAD: &str = r#"{
    "name": "Spot 250 Pro",
    "shortName": "Spot250P",
    "categories": ["Moving Head", "Color Changer"],
    "meta": {
        "authors": ["Flo Edelmann"],
        "createDate": "2020-04-19",
        "lastModifyDate": "2021-11-02"
    },
    "physical": {
        "dimensions": [330, 420, 330],
        "weight": 11.5,
        "power": 250,
        "DMXconnector": "3-pin",
        "lens": { "degreesMinMax": [14, 14] }
    },
    "availableChannels": {
        "Pan": {
            "fineChannelAliases": ["Pan fine"],
            "defaultValue": 32768,
            "capability": { "type": "Pan", "angleStart": 0, "angleEnd": 540 }
        },
        "Tilt": {
            "fineChannelAliases": ["Tilt fine"],
            "defaultValue": 32768,
            "capability": { "type": "Tilt", "angleStart": 0, "angleEnd": 270 }
        },
        "Dimmer": {
            "capability": { "type": "Intensity" }
        },
        "Shutter": {
            "defaultValue": 32,
            "capabilities": [
                { "type": "ShutterStrobe", "shutterEffect": "closed", "dmxRange": [0, 31],
                  "switchChannels": { "Speed": "Gobo Rotation Speed" } },
                { "type": "ShutterStrobe", "shutterEffect": "open", "dmxRange": [32, 63],
                  "switchChannels": { "Speed": "Gobo Rotation Speed" } },
                { "type": "ShutterStrobe", "shutterEffect": "strobe",
                  "speedStart": 0.5, "speedEnd": 10, "dmxRange": [64, 255],
                  "switchChannels": { "Speed": "Strobe Speed" } }
            ]
        },
        "Gobo Rotation Speed": {
            "capability": { "type": "WheelRotation", "speedStart": 0, "speedEnd": 1 }
        },
        "Strobe Speed": {
            "capability": { "type": "StrobeSpeed", "speedStart": 0, "speedEnd": 1 }
        }
    },
    "modes": [
        {
            "name": "Basic 3-channel",
            "shortName": "3ch",
            "channels": ["Pan", "Tilt", "Dimmer"]
        },
        {
            "name": "Extended",
            "channels": ["Pan", "Pan fine", "Tilt", "Tilt fine", null, "Dimmer", "Shutter", "Speed"]
        }
    ]
}"#;

#[test]
fn moving_head_parses_without_problems() -> Result<()> {
    let ParsedFixture { fixture, problems } =
        parse_fixture(acme(), key("spot-250-pro"), MOVING_HEAD)?;

    assert!(problems.is_empty(), "unexpected problems: {problems:?}");
    assert_eq!(fixture.name, "Spot 250 Pro");
    assert_eq!(fixture.manufacturer.name, "Acme");
    assert_eq!(
        fixture.main_category().map(|c| c.to_string()),
        Some("Moving Head".to_string())
    );

    let pan = fixture
        .channel_by_key(&key("Pan"))
        .and_then(|c| c.as_coarse().cloned())
        .ok_or_else(|| anyhow::anyhow!("Pan missing"))?;
    assert_eq!(pan.resolution, Resolution::SIXTEEN_BIT);
    assert_eq!(pan.value_resolution, Resolution::SIXTEEN_BIT);
    assert_eq!(pan.default_value_at(Resolution::EIGHT_BIT), 128);

    Ok(())
}

#[test]
fn all_channels_order_is_declaration_then_fine_then_switching() -> Result<()> {
    let ParsedFixture { fixture, .. } =
        parse_fixture(acme(), key("spot-250-pro"), MOVING_HEAD)?;

    let keys: Vec<&Key> = fixture.all_channels().map(|c| c.key()).collect();
    assert_eq!(
        keys,
        [
            "Pan",
            "Pan fine",
            "Tilt",
            "Tilt fine",
            "Dimmer",
            "Shutter",
            "Speed",
            "Gobo Rotation Speed",
            "Strobe Speed",
        ]
    );
    Ok(())
}

#[test]
fn mode_resolution_is_deterministic_and_order_preserving() -> Result<()> {
    let first = parse_fixture(acme(), key("spot-250-pro"), MOVING_HEAD)?;
    let second = parse_fixture(acme(), key("spot-250-pro"), MOVING_HEAD)?;

    for (mode_a, mode_b) in first.fixture.modes().iter().zip(second.fixture.modes()) {
        assert_eq!(mode_a.channels, mode_b.channels);
        let keys_a: Vec<&Key> = first.fixture.mode_channels(mode_a).map(|c| c.key()).collect();
        let keys_b: Vec<&Key> = second.fixture.mode_channels(mode_b).map(|c| c.key()).collect();
        assert_eq!(keys_a, keys_b);
    }

    let extended = first
        .fixture
        .mode("Extended")
        .ok_or_else(|| anyhow::anyhow!("mode missing"))?;
    let keys: Vec<String> = first
        .fixture
        .mode_channels(extended)
        .map(|c| c.key().to_string())
        .collect();
    assert_eq!(
        keys,
        [
            "Pan",
            "Pan fine",
            "Tilt",
            "Tilt fine",
            "Unused 1",
            "Dimmer",
            "Shutter",
            "Speed",
        ]
    );
    // the null slot occupies a DMX address but is no fixture channel
    assert!(matches!(extended.channels[4], ChannelId::Null(..)));
    Ok(())
}

#[test]
fn switching_channel_resolves_default_target_from_trigger_default() -> Result<()> {
    let ParsedFixture { fixture, .. } =
        parse_fixture(acme(), key("spot-250-pro"), MOVING_HEAD)?;

    let Some(ChannelRef::Switching(speed)) = fixture.channel_by_key(&key("Speed")) else {
        anyhow::bail!("Speed is not a switching channel");
    };
    assert_eq!(speed.trigger_key, "Shutter");
    // Shutter default 32 lies in the open range, which switches to gobo rotation
    assert_eq!(speed.default_target, "Gobo Rotation Speed");
    assert_eq!(speed.target_at(200)?, "Strobe Speed");
    assert_eq!(
        speed
            .switch_to_channel_keys()
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>(),
        ["Gobo Rotation Speed", "Strobe Speed"]
    );
    Ok(())
}

#[test]
fn capability_lookup_through_consumer_surface() -> Result<()> {
    let ParsedFixture { fixture, .. } =
        parse_fixture(acme(), key("spot-250-pro"), MOVING_HEAD)?;

    let shutter = fixture
        .channel_by_key(&key("Shutter"))
        .and_then(|c| c.as_coarse().cloned())
        .ok_or_else(|| anyhow::anyhow!("Shutter missing"))?;

    assert_eq!(shutter.capabilities.len(), 3);
    assert!(shutter.capability().is_none());

    let strobe = shutter
        .capability_at(64, Resolution::EIGHT_BIT)
        .ok_or_else(|| anyhow::anyhow!("no capability at 64"))?;
    assert!(matches!(
        strobe.kind,
        CapabilityKind::ShutterStrobe { .. }
    ));
    // every 8-bit value is covered
    for value in 0..=255 {
        assert!(shutter.capability_at(value, Resolution::EIGHT_BIT).is_some());
    }
    // 16-bit query against the 8-bit declared ranges
    let range = strobe.dmx_range_at(Resolution::EIGHT_BIT, Resolution::SIXTEEN_BIT);
    assert_eq!((range.start, range.end), (16448, 65535));
    Ok(())
}

#[test]
fn unresolved_channel_reference_is_recorded_and_slot_preserved() -> Result<()> {
    let document = r#"{
        "name": "Broken Reference",
        "meta": {
            "authors": [],
            "createDate": "2022-01-01",
            "lastModifyDate": "2022-01-01"
        },
        "availableChannels": {
            "Dimmer": { "capability": { "type": "Intensity" } }
        },
        "modes": [
            { "name": "2ch", "channels": ["Dimmer", "Does Not Exist"] }
        ]
    }"#;
    let parsed = parse_fixture(acme(), key("broken"), document)?;
    assert!(parsed.problems.iter().any(|p| matches!(
        p.problem(),
        Problem::UnresolvedChannelReference { key, mode }
            if *key == "Does Not Exist" && mode == "2ch"
    )));
    // slot order must survive, the bad slot becomes a null channel
    let mode = &parsed.fixture.modes()[0];
    assert_eq!(mode.channel_count(), 2);
    assert!(matches!(mode.channels[1], ChannelId::Null(..)));

    let validated = validate(parsed);
    assert!(validated.has_errors());
    Ok(())
}

#[test]
fn matrix_template_channels_are_instantiated_per_pixel() -> Result<()> {
    let document = r#"{
        "name": "Pixel Bar 4",
        "categories": ["Pixel Bar"],
        "meta": {
            "authors": [],
            "createDate": "2022-01-01",
            "lastModifyDate": "2022-01-01"
        },
        "matrix": {
            "pixelCount": [4, 1, 1],
            "pixelGroups": {
                "All": ["(1, 1, 1)", "(2, 1, 1)", "(3, 1, 1)", "(4, 1, 1)"]
            }
        },
        "templateChannels": {
            "Red $pixelKey": { "capability": { "type": "ColorIntensity", "color": "Red" } }
        },
        "modes": [
            {
                "name": "4ch",
                "channels": ["Red (1, 1, 1)", "Red (2, 1, 1)", "Red (3, 1, 1)", "Red (4, 1, 1)"]
            },
            { "name": "1ch", "channels": ["Red All"] }
        ]
    }"#;
    let ParsedFixture { fixture, problems } =
        parse_fixture(acme(), key("pixel-bar-4"), document)?;
    assert!(problems.is_empty(), "unexpected problems: {problems:?}");

    // one channel per pixel plus one per pixel group
    assert_eq!(fixture.coarse_channels().len(), 5);
    assert!(fixture.channel_by_key(&key("Red (3, 1, 1)")).is_some());
    assert!(fixture.channel_by_key(&key("Red All")).is_some());
    assert_eq!(fixture.matrix_channels().len(), 5);

    let matrix = fixture.matrix.as_ref().ok_or_else(|| anyhow::anyhow!("no matrix"))?;
    assert_eq!(matrix.pixel_count(), 4);
    assert_eq!(matrix.position(&key("(2, 1, 1)")), Some([2, 1, 1]));
    Ok(())
}
