//! Fail-closed parser for `visor://` links

use crate::descriptor::{
    AuthMethod, LinkDescriptor, TransportKind, LINK_SCHEME, MAX_LINK_LEN, PROTOCOL_VERSION,
};
use crate::error::{LinkParseError, Result};

/// Parse and validate a raw link string into a [`LinkDescriptor`].
///
/// Validation runs in grammar order and stops at the first violation; the
/// returned error names the rule that failed. No descriptor is constructed
/// unless every rule passes.
pub fn parse(raw: &str) -> Result<LinkDescriptor> {
    let rest = raw
        .strip_prefix(LINK_SCHEME)
        .ok_or(LinkParseError::WrongScheme)?;
    if raw.len() > MAX_LINK_LEN {
        return Err(LinkParseError::TooLong(raw.len()));
    }

    let (path, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };

    // Path: v{N}/{id}/{transport}/{host}:{port}. The endpoint is the
    // remainder so a host containing '/' still reaches the endpoint rule.
    let mut segments = path.splitn(4, '/');

    let version_seg = segments.next().unwrap_or("");
    let digits = version_seg
        .strip_prefix('v')
        .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| LinkParseError::MalformedVersion(version_seg.to_string()))?;
    let version: u32 = digits
        .parse()
        .map_err(|_| LinkParseError::MalformedVersion(version_seg.to_string()))?;
    if version != PROTOCOL_VERSION {
        return Err(LinkParseError::UnsupportedVersion(version));
    }

    let id = segments.next().ok_or(LinkParseError::MissingSegments)?;
    if id.is_empty() {
        return Err(LinkParseError::EmptyDeviceId);
    }

    let transport_seg = segments.next().ok_or(LinkParseError::MissingSegments)?;
    let transport = TransportKind::from_token(transport_seg)
        .ok_or_else(|| LinkParseError::UnknownTransport(transport_seg.to_string()))?;

    let endpoint = segments.next().ok_or(LinkParseError::MissingSegments)?;
    let (host, port_str) = endpoint.rsplit_once(':').ok_or(LinkParseError::MissingPort)?;
    if host.is_empty() {
        return Err(LinkParseError::EmptyHost);
    }
    let port: u16 = port_str
        .parse()
        .map_err(|_| LinkParseError::InvalidPort(port_str.to_string()))?;

    let mut auth = AuthMethod::Open;
    let mut topic: Option<String> = None;
    if let Some(query) = query {
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                // An empty auth value means open, kept for older encoders.
                "auth" if !value.is_empty() => {
                    auth = AuthMethod::from_token(value)
                        .ok_or_else(|| LinkParseError::UnknownAuthMethod(value.to_string()))?;
                }
                // Topic is passed through verbatim; it may contain '/'.
                "t" if !value.is_empty() => topic = Some(value.to_string()),
                _ => {}
            }
        }
    }

    Ok(LinkDescriptor::from_parts(
        version,
        id.to_string(),
        transport,
        host.to_string(),
        port,
        auth,
        topic,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_link_with_all_params() {
        let link =
            parse("visor://v1/monitor-bed-12/mqtt/192.168.1.10:1883?auth=pin&t=ward3/bed12/vitals")
                .unwrap();

        assert_eq!(link.version(), 1);
        assert_eq!(link.id(), "monitor-bed-12");
        assert_eq!(link.transport(), TransportKind::Mqtt);
        assert_eq!(link.host(), "192.168.1.10");
        assert_eq!(link.port(), 1883);
        assert_eq!(link.auth(), AuthMethod::Pin);
        assert_eq!(link.topic(), Some("ward3/bed12/vitals"));
    }

    #[test]
    fn minimal_link_defaults_to_open() {
        let link = parse("visor://v1/device-001/mqtt/localhost:1883").unwrap();
        assert_eq!(link.id(), "device-001");
        assert_eq!(link.auth(), AuthMethod::Open);
        assert_eq!(link.topic(), None);
    }

    #[test]
    fn auth_without_topic() {
        let link = parse("visor://v1/device-001/mqtt/10.0.0.1:1883?auth=token").unwrap();
        assert_eq!(link.auth(), AuthMethod::Token);
        assert_eq!(link.topic(), None);
    }

    #[test]
    fn topic_without_auth() {
        let link = parse("visor://v1/device-001/mqtt/10.0.0.1:1883?t=sensors/temp").unwrap();
        assert_eq!(link.auth(), AuthMethod::Open);
        assert_eq!(link.topic(), Some("sensors/temp"));
    }

    #[test]
    fn every_transport_token_parses() {
        for kind in TransportKind::ALL {
            let link = parse(&format!("visor://v1/dev/{kind}/host:8080")).unwrap();
            assert_eq!(link.transport(), kind);
        }
    }

    #[test]
    fn every_auth_token_parses() {
        for auth in ["open", "pin", "token", "mtls", "mfa"] {
            let link = parse(&format!("visor://v1/dev/mqtt/host:1883?auth={auth}")).unwrap();
            assert_eq!(link.auth().as_str(), auth);
        }
    }

    #[test]
    fn unknown_auth_rejects_whole_link() {
        // Fail closed: never coerce an unknown method to open.
        assert_eq!(
            parse("visor://v1/dev/mqtt/host:1883?auth=foobar"),
            Err(LinkParseError::UnknownAuthMethod("foobar".into()))
        );
    }

    #[test]
    fn over_length_link_rejected() {
        let long = format!("visor://v1/dev/mqtt/host:1883?t={}", "a".repeat(500));
        assert!(matches!(parse(&long), Err(LinkParseError::TooLong(_))));
    }

    #[test]
    fn wrong_scheme_rejected() {
        assert_eq!(parse("http://example.com"), Err(LinkParseError::WrongScheme));
        assert_eq!(parse("mqtt://broker:1883"), Err(LinkParseError::WrongScheme));
        assert_eq!(parse(""), Err(LinkParseError::WrongScheme));
    }

    #[test]
    fn unknown_transport_rejected() {
        assert_eq!(
            parse("visor://v1/dev/ftp/host:21"),
            Err(LinkParseError::UnknownTransport("ftp".into()))
        );
    }

    #[test]
    fn wrong_version_rejected() {
        assert_eq!(
            parse("visor://v2/dev/mqtt/host:1883"),
            Err(LinkParseError::UnsupportedVersion(2))
        );
    }

    #[test]
    fn malformed_version_rejected() {
        assert!(matches!(
            parse("visor://1/dev/mqtt/host:1883"),
            Err(LinkParseError::MalformedVersion(_))
        ));
        assert!(matches!(
            parse("visor://vx/dev/mqtt/host:1883"),
            Err(LinkParseError::MalformedVersion(_))
        ));
        assert!(matches!(
            parse("visor://v/dev/mqtt/host:1883"),
            Err(LinkParseError::MalformedVersion(_))
        ));
    }

    #[test]
    fn too_few_segments_rejected() {
        assert_eq!(
            parse("visor://v1/dev/mqtt"),
            Err(LinkParseError::MissingSegments)
        );
        assert_eq!(parse("visor://v1/dev"), Err(LinkParseError::MissingSegments));
        assert_eq!(parse("visor://v1"), Err(LinkParseError::MissingSegments));
    }

    #[test]
    fn empty_device_id_rejected() {
        assert_eq!(
            parse("visor://v1//mqtt/host:1883"),
            Err(LinkParseError::EmptyDeviceId)
        );
    }

    #[test]
    fn missing_port_rejected() {
        assert_eq!(
            parse("visor://v1/dev/mqtt/hostonly"),
            Err(LinkParseError::MissingPort)
        );
    }

    #[test]
    fn non_numeric_port_rejected() {
        assert_eq!(
            parse("visor://v1/dev/mqtt/host:abc"),
            Err(LinkParseError::InvalidPort("abc".into()))
        );
    }

    #[test]
    fn out_of_range_port_rejected() {
        assert_eq!(
            parse("visor://v1/dev/mqtt/host:70000"),
            Err(LinkParseError::InvalidPort("70000".into()))
        );
    }

    #[test]
    fn empty_host_rejected() {
        assert_eq!(
            parse("visor://v1/dev/mqtt/:1883"),
            Err(LinkParseError::EmptyHost)
        );
    }

    #[test]
    fn empty_auth_value_means_open() {
        let link = parse("visor://v1/dev/mqtt/host:1883?auth=").unwrap();
        assert_eq!(link.auth(), AuthMethod::Open);
    }

    #[test]
    fn unknown_query_keys_ignored() {
        let link = parse("visor://v1/dev/mqtt/host:1883?x=1&t=a/b&y=2").unwrap();
        assert_eq!(link.topic(), Some("a/b"));
        assert_eq!(link.auth(), AuthMethod::Open);
    }

    #[test]
    fn ipv6_style_host_takes_last_colon_as_port() {
        let link = parse("visor://v1/dev/mqtt/fe80::1:1883").unwrap();
        assert_eq!(link.host(), "fe80::1");
        assert_eq!(link.port(), 1883);
    }
}
