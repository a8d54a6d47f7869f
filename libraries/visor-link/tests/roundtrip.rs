//! Round-trip property: any well-formed link survives serialize -> parse
//! with identity fields intact.

use proptest::prelude::*;
use visor_link::{parse, AuthMethod, LinkDescriptor, TransportKind};

fn transport_kind() -> impl Strategy<Value = TransportKind> {
    prop::sample::select(TransportKind::ALL.to_vec())
}

fn auth_method() -> impl Strategy<Value = AuthMethod> {
    prop::sample::select(vec![
        AuthMethod::Open,
        AuthMethod::Pin,
        AuthMethod::Token,
        AuthMethod::Mtls,
        AuthMethod::Mfa,
    ])
}

// Segment alphabets deliberately exclude the grammar's delimiters
// ('/', ':', '?', '&', '=') except where the grammar allows them.
fn device_id() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9_-]{0,23}"
}

fn host() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9.-]{0,23}"
}

fn topic() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-z0-9]{1,8}(/[a-z0-9]{1,8}){0,3}")
}

proptest! {
    #[test]
    fn parse_inverts_display(
        id in device_id(),
        kind in transport_kind(),
        host in host(),
        port in 1u16..,
        auth in auth_method(),
        topic in topic(),
    ) {
        let mut link = LinkDescriptor::new(id, kind, host, port).with_auth(auth);
        if let Some(t) = topic {
            link = link.with_topic(t);
        }

        let reparsed = parse(&link.to_string()).expect("well-formed link must parse");

        prop_assert_eq!(reparsed.version(), link.version());
        prop_assert_eq!(reparsed.id(), link.id());
        prop_assert_eq!(reparsed.transport(), link.transport());
        prop_assert_eq!(reparsed.host(), link.host());
        prop_assert_eq!(reparsed.port(), link.port());
        prop_assert_eq!(reparsed.auth(), link.auth());
        prop_assert_eq!(reparsed.topic(), link.topic());
    }
}
