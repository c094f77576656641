//! Property-based tests for the multipart codec.
//!
//! ## Test Categories
//! 1. **Round-trip**: decoded parts match encoded fields, in order
//! 2. **Read-size independence**: output does not depend on read sizes
//! 3. **Reset idempotence**: replayed output is byte-identical
//! 4. **Length correctness**: `length()` equals drained byte count

mod common;

use std::io::Cursor;

use common::drain;
use fcp_multipart::{Field, FileField, MultipartConfig, MultipartDecoder, MultipartEncoder};
use proptest::prelude::*;

/// Generated field shape.
#[derive(Clone, Debug)]
enum Shape {
    Text(String, String),
    Bytes(String, Vec<u8>),
    File {
        name: String,
        filename: String,
        content: Vec<u8>,
        content_type: Option<String>,
    },
}

impl Shape {
    fn content(&self) -> &[u8] {
        match self {
            Self::Text(_, value) => value.as_bytes(),
            Self::Bytes(_, value) | Self::File { content: value, .. } => value,
        }
    }

    fn to_field(&self) -> Field<'static> {
        match self {
            Self::Text(name, value) => Field::text(name.clone(), value.clone()),
            Self::Bytes(name, value) => Field::bytes(name.clone(), value.clone()),
            Self::File {
                name,
                filename,
                content,
                content_type,
            } => {
                let file = FileField::new(filename.clone(), Cursor::new(content.clone()));
                let file = match content_type {
                    Some(content_type) => file.with_content_type(content_type.clone()),
                    None => file,
                };
                Field::file(name.clone(), file)
            }
        }
    }
}

fn encoder_for(shapes: &[Shape], config: &MultipartConfig) -> MultipartEncoder<'static> {
    MultipartEncoder::from_fields(shapes.iter().map(Shape::to_field), config).unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Proptest Strategies
// ─────────────────────────────────────────────────────────────────────────────

/// Field names without quote or line-break characters.
fn field_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_\\-\\[\\]. ]{1,24}"
}

/// Arbitrary content bytes. Random generated boundaries make a collision
/// with the 32-character token negligible.
fn content_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

fn field_shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        (field_name(), "\\PC{0,64}").prop_map(|(name, value)| Shape::Text(name, value)),
        (field_name(), content_bytes()).prop_map(|(name, value)| Shape::Bytes(name, value)),
        (
            field_name(),
            field_name(),
            content_bytes(),
            prop::option::of("(text|image|application)/[a-z0-9.+-]{1,16}"),
        )
            .prop_map(|(name, filename, content, content_type)| Shape::File {
                name,
                filename,
                content,
                content_type,
            }),
    ]
}

fn field_shapes() -> impl Strategy<Value = Vec<Shape>> {
    prop::collection::vec(field_shape(), 0..6)
}

// ─────────────────────────────────────────────────────────────────────────────
// Property Tests
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Decoding the encoder's output yields one part per field, in order,
    /// with identical content.
    #[test]
    fn round_trip_preserves_fields(shapes in field_shapes()) {
        let mut encoder = encoder_for(&shapes, &MultipartConfig::default());
        let content_type = encoder.content_type().to_string();
        let body = encoder.to_bytes().unwrap();

        let decoder = MultipartDecoder::new(body, &content_type).unwrap();
        prop_assert_eq!(decoder.len(), shapes.len());

        for (shape, part) in shapes.iter().zip(decoder.iter()) {
            prop_assert_eq!(part.content().as_ref(), shape.content());
            if let Shape::File { content_type, .. } = shape {
                prop_assert_eq!(part.header("content-type"), content_type.as_deref());
            }
        }
    }

    /// Output is independent of how the caller slices reads.
    #[test]
    fn read_size_does_not_change_output(
        shapes in field_shapes(),
        step in 1usize..300,
    ) {
        let config = MultipartConfig::default().with_boundary("proptest-boundary");
        let whole = encoder_for(&shapes, &config).to_bytes().unwrap();
        let sliced = drain(&mut encoder_for(&shapes, &config), step);
        prop_assert_eq!(whole.as_ref(), sliced.as_slice());
    }

    /// Reset after a full or partial read replays identical bytes.
    #[test]
    fn reset_is_idempotent(
        shapes in field_shapes(),
        first_step in 1usize..128,
        partial in 0usize..256,
    ) {
        let mut encoder = encoder_for(&shapes, &MultipartConfig::default());
        let first = drain(&mut encoder, first_step);

        encoder.reset().unwrap();
        let _ = encoder.read(partial).unwrap();
        encoder.reset().unwrap();

        let second = drain(&mut encoder, 64);
        prop_assert_eq!(first, second);
    }

    /// For sized sources `length()` is exact.
    #[test]
    fn length_is_exact(shapes in field_shapes(), step in 1usize..512) {
        let mut encoder = encoder_for(&shapes, &MultipartConfig::default());
        let length = encoder.length();
        prop_assert!(length.is_some());

        let body = drain(&mut encoder, step);
        prop_assert_eq!(Some(body.len() as u64), length);
        prop_assert!(encoder.is_finished());
    }
}
