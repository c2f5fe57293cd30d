//! Key binding helper property tests
//!
//! Prefix mode and modifier mode must produce distinct, well-formed sequences
//! for any two-character mnemonic.

use cljr::input::{
    key_pairs_with_modifier, key_pairs_with_prefix, KeyCode, KeyLookupResult, KeyModifiers,
    Keymap,
};
use cljr::{Command, Key};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

fn mnemonic() -> impl Strategy<Value = (char, char)> {
    (proptest::char::range('a', 'z'), proptest::char::range('a', 'z'))
}

fn prefix_strategy() -> impl Strategy<Value = (&'static str, Vec<Key>)> {
    prop_oneof![
        Just(("C-c", vec![Key::ctrl('c')])),
        Just(("C-c C-m", vec![Key::ctrl('c'), Key::ctrl('m')])),
        Just(("M-r", vec![Key::alt('r')])),
    ]
}

fn modifier_strategy() -> impl Strategy<Value = (&'static str, KeyModifiers)> {
    prop_oneof![
        Just((
            "C-",
            KeyModifiers {
                ctrl: true,
                ..KeyModifiers::NONE
            }
        )),
        Just((
            "M-",
            KeyModifiers {
                alt: true,
                ..KeyModifiers::NONE
            }
        )),
        Just((
            "s-",
            KeyModifiers {
                super_key: true,
                ..KeyModifiers::NONE
            }
        )),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prefix_mode_appends_plain_keys((prefix, prefix_keys) in prefix_strategy(), (a, b) in mnemonic()) {
        let keys = format!("{}{}", a, b);
        let sequence = key_pairs_with_prefix(prefix, &keys).unwrap();

        let mut expected = prefix_keys.clone();
        expected.push(Key::plain(a));
        expected.push(Key::plain(b));
        prop_assert_eq!(&sequence.keys, &expected);
    }

    #[test]
    fn modifier_mode_chords_every_character((modifier, modifiers) in modifier_strategy(), (a, b) in mnemonic()) {
        let keys = format!("{}{}", a, b);
        let sequence = key_pairs_with_modifier(modifier, &keys).unwrap();

        prop_assert_eq!(sequence.len(), 2);
        prop_assert_eq!(sequence.keys[0], Key::new(modifiers, KeyCode::Char(a)));
        prop_assert_eq!(sequence.keys[1], Key::new(modifiers, KeyCode::Char(b)));

        let prefixed = key_pairs_with_prefix(modifier.trim_end_matches('-'), &keys);
        if let Ok(prefixed) = prefixed {
            prop_assert_ne!(prefixed, sequence);
        }
    }

    #[test]
    fn prefix_keymap_dispatches_every_command((prefix, prefix_keys) in prefix_strategy()) {
        let mut keymap = Keymap::with_prefix(prefix).unwrap();

        for command in Command::ALL {
            let mut result = KeyLookupResult::Unbound;
            let mnemonic_keys = command.mnemonic().chars().map(Key::plain);
            for key in prefix_keys.iter().copied().chain(mnemonic_keys) {
                result = keymap.process_key(key);
            }
            prop_assert_eq!(result, KeyLookupResult::Command(command));
            prop_assert!(!keymap.is_partial_match());
        }
    }
}

#[test]
fn test_super_control_special_cases() {
    let super_only = KeyModifiers {
        super_key: true,
        ..KeyModifiers::NONE
    };

    let import = key_pairs_with_modifier("C-s-", "ai").unwrap();
    assert_eq!(import.keys[1], Key::new(super_only, KeyCode::Tab));
    assert_eq!(import.to_string(), "C-s-a s-TAB");

    let sequence = key_pairs_with_modifier("C-s-", "mr").unwrap();
    assert_eq!(sequence.keys[0], Key::new(super_only, KeyCode::Enter));
}
