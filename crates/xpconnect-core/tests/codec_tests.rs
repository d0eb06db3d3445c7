//! Codec tests for XPConnect core

use xpconnect_core::codec::{self, header, DREF_LEN, RREF_REQUEST_LEN};
use xpconnect_core::{DataRefValue, Error, Message, ValueUpdate};

fn rref_inbound(pairs: &[(i32, f32)]) -> Vec<u8> {
    let mut buf = b"RREF,".to_vec();
    for (id, value) in pairs {
        buf.extend_from_slice(&id.to_le_bytes());
        buf.extend_from_slice(&value.to_le_bytes());
    }
    buf
}

#[test]
fn test_request_layout() {
    let msg = Message::Request {
        frequency: 5,
        id: 3,
        path: "sim/foo".to_string(),
    };

    let encoded = codec::encode(&msg).expect("encode failed");

    assert_eq!(encoded.len(), RREF_REQUEST_LEN);
    assert_eq!(&encoded[..4], header::RREF);
    assert_eq!(i32::from_le_bytes(encoded[4..8].try_into().unwrap()), 5);
    assert_eq!(i32::from_le_bytes(encoded[8..12].try_into().unwrap()), 3);
    assert_eq!(&encoded[12..19], b"sim/foo");
    assert!(encoded[19..].iter().all(|b| *b == 0), "trailing bytes must be zero");
}

#[test]
fn test_stop_request_has_zero_frequency() {
    let encoded = codec::encode(&Message::stop_request(11, "sim/bar")).expect("encode failed");

    assert_eq!(encoded.len(), RREF_REQUEST_LEN);
    assert_eq!(i32::from_le_bytes(encoded[4..8].try_into().unwrap()), 0);
    assert_eq!(i32::from_le_bytes(encoded[8..12].try_into().unwrap()), 11);
}

#[test]
fn test_set_float_layout() {
    let msg = Message::SetValue {
        path: "sim/cockpit/autopilot/altitude".to_string(),
        value: DataRefValue::Float(12000.0),
    };

    let encoded = codec::encode(&msg).expect("encode failed");

    assert_eq!(encoded.len(), DREF_LEN);
    assert_eq!(&encoded[..4], header::DREF);
    assert_eq!(f32::from_le_bytes(encoded[4..8].try_into().unwrap()), 12000.0);
    let path_end = 8 + "sim/cockpit/autopilot/altitude".len();
    assert_eq!(&encoded[8..path_end], b"sim/cockpit/autopilot/altitude");
    assert!(encoded[path_end..].iter().all(|b| *b == 0));
}

#[test]
fn test_set_string_layout() {
    let msg = Message::SetValue {
        path: "sim/aircraft/view/acf_tailnum".to_string(),
        value: "N172SP".into(),
    };

    let encoded = codec::encode(&msg).expect("encode failed");

    assert_eq!(encoded.len(), DREF_LEN);
    assert_eq!(&encoded[4..11], b"N172SP\0");
    assert_eq!(&encoded[11..40], b"sim/aircraft/view/acf_tailnum");
    assert_eq!(encoded[40], 0);
}

#[test]
fn test_set_string_too_long() {
    let msg = Message::SetValue {
        path: "sim/x".to_string(),
        value: DataRefValue::String("x".repeat(600)),
    };

    match codec::encode(&msg) {
        Err(Error::PayloadTooLarge { limit, .. }) => assert_eq!(limit, DREF_LEN),
        other => panic!("Expected PayloadTooLarge, got {:?}", other),
    }
}

#[test]
fn test_unpadded_messages() {
    let cmnd = codec::encode(&Message::Command {
        command: "sim/operation/pause_toggle".to_string(),
    })
    .unwrap();
    assert_eq!(&cmnd[..], b"CMNDsim/operation/pause_toggle\0");

    let quit = codec::encode(&Message::Quit).unwrap();
    assert_eq!(&quit[..], b"QUIT");

    let fail = codec::encode(&Message::Fail { system: 42 }).unwrap();
    assert_eq!(&fail[..], b"FAIL42\0");

    let reco = codec::encode(&Message::Recover { system: 42 }).unwrap();
    assert_eq!(&reco[..], b"RECO42\0");
}

#[test]
fn test_decode_value_pairs() {
    let buf = rref_inbound(&[(7, 42.5), (8, -1.25)]);

    let updates = codec::decode(&buf).expect("decode failed").expect("RREF packet");

    assert_eq!(
        updates,
        vec![
            ValueUpdate { id: 7, value: 42.5 },
            ValueUpdate { id: 8, value: -1.25 },
        ]
    );
}

#[test]
fn test_decode_prefix_byte_is_ignored() {
    let mut buf = rref_inbound(&[(7, 42.5)]);
    buf[4] = 0xAB;

    let updates = codec::decode(&buf).unwrap().unwrap();
    assert_eq!(updates, vec![ValueUpdate { id: 7, value: 42.5 }]);
}

#[test]
fn test_decode_ignores_other_headers() {
    let mut buf = rref_inbound(&[(7, 42.5)]);
    buf[..4].copy_from_slice(b"DATA");

    assert_eq!(codec::decode(&buf).unwrap(), None);
}

#[test]
fn test_decode_truncated_pair() {
    let mut buf = rref_inbound(&[(7, 42.5)]);
    buf.truncate(buf.len() - 3);

    assert!(matches!(codec::decode(&buf), Err(Error::Decode(_))));
}

#[test]
fn test_decode_values_reads_complete_pairs_before_truncation() {
    let mut buf = rref_inbound(&[(7, 42.5), (8, 3.0)]);
    buf.truncate(buf.len() - 5);

    let values = codec::decode_values(&buf).expect("RREF packet");
    assert_eq!(values.updates, vec![ValueUpdate { id: 7, value: 42.5 }]);
    assert_eq!(values.trailing, 3);
    assert!(matches!(values.check_complete(), Err(Error::Decode(_))));

    let whole = codec::decode_values(&rref_inbound(&[(7, 42.5)])).unwrap();
    assert_eq!(whole.trailing, 0);
    assert!(whole.check_complete().is_ok());
}

#[test]
fn test_request_round_trip_through_inbound_reader() {
    // Read back id and path bytes from an encoded request the way a
    // simulator would
    let encoded = codec::encode(&Message::Request {
        frequency: 5,
        id: 3,
        path: "sim/foo".to_string(),
    })
    .unwrap();

    let id = i32::from_le_bytes(encoded[8..12].try_into().unwrap());
    let path_bytes: Vec<u8> = encoded[12..].iter().take_while(|b| **b != 0).copied().collect();

    assert_eq!(id, 3);
    assert_eq!(String::from_utf8(path_bytes).unwrap(), "sim/foo");
}
