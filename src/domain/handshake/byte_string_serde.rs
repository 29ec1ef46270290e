// serde derives encode `Vec<u8>` as a sequence of integers (one CBOR item per
// byte). Handshake fields are raw key/nonce/signature material, so they go over
// the wire as CBOR byte strings instead, and only byte strings are accepted
// back. Use with `#[serde(with = "...")]`.
use core::fmt;
use serde::{Deserializer, Serializer};

pub(crate) fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_bytes(bytes)
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
    struct V;
    impl<'de> serde::de::Visitor<'de> for V {
        type Value = Vec<u8>;
        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a byte string")
        }
        fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
            Ok(v.to_vec())
        }
        fn visit_byte_buf<E: serde::de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
            Ok(v)
        }
    }
    d.deserialize_bytes(V)
}

#[cfg(test)]
mod tests {
    use ciborium::{de::from_reader, ser::into_writer};
    use serde::{Deserialize, Serialize};
    use std::io::Cursor;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "super")]
        data: Vec<u8>,
    }

    #[test]
    fn encodes_as_cbor_byte_string() {
        let h = Holder {
            data: vec![0xAA; 40],
        };
        let mut buf = Vec::new();
        into_writer(&h, &mut buf).unwrap();
        // map(1) + text "data" (5) + bytes header (2) + 40 payload bytes
        assert_eq!(buf.len(), 1 + 5 + 2 + 40);
        let de: Holder = from_reader(Cursor::new(&buf)).unwrap();
        assert_eq!(de, h);
    }

    #[test]
    fn integer_sequence_form_is_rejected() {
        #[derive(Serialize)]
        struct Loose {
            data: Vec<u8>,
        }
        let mut buf = Vec::new();
        into_writer(&Loose { data: vec![1, 2, 3] }, &mut buf).unwrap();
        assert!(from_reader::<Holder, _>(Cursor::new(&buf)).is_err());
    }

    #[test]
    fn huge_array_header_fails_without_allocating() {
        // {"data": array(2^40)} with no elements following.
        let mut buf = vec![0xa1, 0x64];
        buf.extend_from_slice(b"data");
        buf.push(0x9b);
        buf.extend_from_slice(&(1u64 << 40).to_be_bytes());
        assert!(from_reader::<Holder, _>(Cursor::new(&buf)).is_err());
    }

    #[test]
    fn rejects_non_byte_values() {
        #[derive(Serialize)]
        struct Wrong {
            data: &'static str,
        }
        let mut buf = Vec::new();
        into_writer(&Wrong { data: "nope" }, &mut buf).unwrap();
        assert!(from_reader::<Holder, _>(Cursor::new(&buf)).is_err());
    }
}
