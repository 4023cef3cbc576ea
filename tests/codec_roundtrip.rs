//! Property tests for message parsing and frame clamping.

use ircbot::codec::{MAX_FRAME_LEN, clamp_frame};
use ircbot::message::Message;
use proptest::prelude::*;

fn prefix_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        // Server host style.
        "[a-z][a-z0-9.-]{0,20}",
        // User triplet style.
        ("[a-zA-Z][a-zA-Z0-9_-]{0,8}", "[a-z~][a-z0-9]{0,8}", "[a-z][a-z0-9.-]{0,15}")
            .prop_map(|(n, u, h)| format!("{n}!{u}@{h}")),
    ]
}

fn command_strategy() -> impl Strategy<Value = String> {
    prop_oneof!["[A-Z]{3,8}", "[0-9]{3}"]
}

proptest! {
    #[test]
    fn display_then_parse_preserves_structure(
        prefix in prefix_strategy(),
        command in command_strategy(),
        middles in prop::collection::vec("[a-zA-Z0-9#&+@._-]{1,12}", 0..4),
        trailing in prop::option::of("[ -~]{0,40}"),
    ) {
        let mut params = middles;
        if let Some(t) = trailing {
            params.push(t);
        }
        let original = Message {
            raw: String::new(),
            prefix,
            command,
            params,
        };

        let wire = original.to_string();
        let parsed = Message::parse(&wire).unwrap();
        prop_assert_eq!(&parsed.prefix, &original.prefix);
        prop_assert_eq!(&parsed.command, &original.command);
        prop_assert_eq!(&parsed.params, &original.params);
    }

    #[test]
    fn clamped_frames_fit_and_terminate(body in "[ -~]{0,700}") {
        match clamp_frame(&body) {
            None => prop_assert!(body.trim().is_empty()),
            Some(frame) => {
                prop_assert!(frame.len() <= MAX_FRAME_LEN);
                prop_assert!(frame.ends_with("\r\n"));
                let payload = &frame[..frame.len() - 2];
                if body.len() > MAX_FRAME_LEN - 2 {
                    // Truncation trims the whitespace it may expose.
                    prop_assert_eq!(payload, payload.trim_end());
                } else {
                    // Short content passes through byte-for-byte.
                    prop_assert_eq!(payload, body.as_str());
                }
            }
        }
    }

    #[test]
    fn clamp_never_splits_multibyte_chars(body in "\\PC{0,300}") {
        if let Some(frame) = clamp_frame(&body) {
            // String construction would already have panicked on a bad cut;
            // assert the invariants hold anyway.
            prop_assert!(frame.len() <= MAX_FRAME_LEN);
            prop_assert!(std::str::from_utf8(frame.as_bytes()).is_ok());
        }
    }
}
