//! Line-number table decoding.
//!
//! A compiled class carries debug metadata mapping source lines to
//! method-local code offsets. We decode that statically — no semantic
//! analysis, no decompilation — into a per-class [`LineTable`] from line
//! number to the declaring method's identity.

use crate::error::{BytescopeError, Result};
use bytescope_api::ResolvedLocation;
use ristretto_classfile::ClassFile;
use ristretto_classfile::attributes::Attribute;
use std::collections::BTreeMap;
use std::io::Cursor;
use tracing::debug;

/// Sorted mapping from source line to the method declaring it.
///
/// Immutable once built; first writer wins, so when several buffers cover
/// one source file (nested types compiled from it), the earliest buffer's
/// entry for a duplicated line takes precedence.
#[derive(Debug, Default)]
pub struct LineTable {
    entries: BTreeMap<u32, ResolvedLocation>,
}

impl LineTable {
    /// Decode one or more class byte buffers into a line table.
    ///
    /// Buffers are visited in the given order, methods in declaration order;
    /// a line already present in the table is never overwritten.
    pub fn from_class_bytes(buffers: impl IntoIterator<Item = Vec<u8>>) -> Result<Self> {
        let mut entries = BTreeMap::new();

        for bytes in buffers {
            let class_file = ClassFile::from_bytes(&mut Cursor::new(bytes))
                .map_err(|e| BytescopeError::ClassFormat(format!("{e:?}")))?;
            visit_class(&class_file, &mut entries)?;
        }

        Ok(Self { entries })
    }

    /// Exact-match lookup; a line with no recorded entry is a typed failure,
    /// never a nearby guess
    pub fn at(&self, line: u32) -> Result<&ResolvedLocation> {
        self.entries
            .get(&line)
            .ok_or_else(|| self.not_found(line))
    }

    /// Nearest-later-line lookup, reachable only through the explicit
    /// fallback configuration flag
    pub fn at_or_following(&self, line: u32) -> Result<&ResolvedLocation> {
        self.entries
            .range(line..)
            .next()
            .map(|(_, location)| location)
            .ok_or_else(|| self.not_found(line))
    }

    /// All recorded lines, ascending
    pub fn lines(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn not_found(&self, line: u32) -> BytescopeError {
        let class_signature = self
            .entries
            .values()
            .next()
            .map(|location| location.class_signature.clone())
            .unwrap_or_default();
        BytescopeError::LocationNotFound {
            class_signature,
            line,
        }
    }
}

fn visit_class(class_file: &ClassFile, entries: &mut BTreeMap<u32, ResolvedLocation>) -> Result<()> {
    let class_name = class_file
        .class_name()
        .map_err(|e| BytescopeError::ClassFormat(format!("{e:?}")))?;
    let class_signature = format!("L{class_name};");

    let before = entries.len();
    for method in &class_file.methods {
        let method_name = class_file
            .constant_pool
            .try_get_utf8(method.name_index)
            .map_err(|e| BytescopeError::ClassFormat(format!("{e:?}")))?;
        let method_descriptor = class_file
            .constant_pool
            .try_get_utf8(method.descriptor_index)
            .map_err(|e| BytescopeError::ClassFormat(format!("{e:?}")))?;

        for attribute in &method.attributes {
            let Attribute::Code { attributes, .. } = attribute else {
                continue;
            };
            for code_attribute in attributes {
                let Attribute::LineNumberTable { line_numbers, .. } = code_attribute else {
                    continue;
                };
                for line_number in line_numbers {
                    entries
                        .entry(u32::from(line_number.line_number))
                        .or_insert_with(|| ResolvedLocation {
                            class_signature: class_signature.clone(),
                            line: u32::from(line_number.line_number),
                            method_name: method_name.to_string(),
                            method_descriptor: method_descriptor.to_string(),
                        });
                }
            }
        }
    }

    debug!(
        class = %class_name,
        lines = entries.len() - before,
        "decoded line number table"
    );
    Ok(())
}
