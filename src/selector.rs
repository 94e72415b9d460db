//! Target-bit selectors
//!
//! Callers name the bits an assertion observes in whatever form is handy: a
//! single index, a list, a range, a whole register, or register-relative
//! bits. [`BitSelector::resolve`] is the one routine that turns every form
//! into a flat, ordered list of indices into the program's bit space.

use crate::circuit::{BitSpace, Register, RegisterKind};
use crate::error::{BreakpointError, Result};
use serde::{Deserialize, Serialize};
use std::ops::{Range, RangeInclusive};

/// Bit `index` of register `register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitRef {
    pub register: String,
    pub index: usize,
}

impl BitRef {
    pub fn new(register: impl Into<String>, index: usize) -> Self {
        Self {
            register: register.into(),
            index,
        }
    }
}

/// Any of the accepted target-bit forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitSelector {
    /// Flat index
    Index(usize),
    /// Flat indices, in order
    Indices(Vec<usize>),
    /// Contiguous flat indices
    Range(Range<usize>),
    /// Every bit of the named register
    Register(String),
    /// Register-relative bits, in order
    Bits(Vec<BitRef>),
}

impl BitSelector {
    pub fn register(name: impl Into<String>) -> Self {
        BitSelector::Register(name.into())
    }

    /// Resolve against the `kind` bits of `space`
    ///
    /// # Errors
    /// `Configuration` if the selection is empty, names an unknown register,
    /// reaches outside the bit space, or repeats a bit.
    ///
    /// # Example
    /// ```
    /// use qbreak::circuit::{Circuit, RegisterKind};
    /// use qbreak::selector::{BitRef, BitSelector};
    ///
    /// let circuit = Circuit::with_size("c", 3, 3);
    /// let space = circuit.space();
    /// let by_range = BitSelector::from(0..3).resolve(space, RegisterKind::Quantum).unwrap();
    /// let by_register = BitSelector::register("q").resolve(space, RegisterKind::Quantum).unwrap();
    /// assert_eq!(by_range, vec![0, 1, 2]);
    /// assert_eq!(by_range, by_register);
    /// ```
    pub fn resolve(&self, space: &BitSpace, kind: RegisterKind) -> Result<Vec<usize>> {
        let bound = space.size(kind);
        let indices = match self {
            BitSelector::Index(i) => vec![*i],
            BitSelector::Indices(v) => v.clone(),
            // bounds first: the range is materialised below
            BitSelector::Range(r) if r.end > bound && !r.is_empty() => {
                return Err(BreakpointError::config(format!(
                    "{} bits {}..{} out of range ({} available)",
                    kind_name(kind),
                    r.start,
                    r.end,
                    bound
                )));
            }
            BitSelector::Range(r) => r.clone().collect(),
            BitSelector::Register(name) => {
                let (offset, size) = lookup(space, name, kind)?;
                (offset..offset + size).collect()
            }
            BitSelector::Bits(bits) => bits
                .iter()
                .map(|bit| {
                    let (offset, size) = lookup(space, &bit.register, kind)?;
                    if bit.index >= size {
                        return Err(BreakpointError::config(format!(
                            "bit {}[{}] out of range (register size {})",
                            bit.register, bit.index, size
                        )));
                    }
                    Ok(offset + bit.index)
                })
                .collect::<Result<Vec<_>>>()?,
        };

        if indices.is_empty() {
            return Err(BreakpointError::config(format!(
                "empty {} bit selection",
                kind_name(kind)
            )));
        }

        for (pos, &index) in indices.iter().enumerate() {
            if index >= bound {
                return Err(BreakpointError::config(format!(
                    "{} bit {} out of range ({} available)",
                    kind_name(kind),
                    index,
                    bound
                )));
            }
            if indices[..pos].contains(&index) {
                return Err(BreakpointError::config(format!(
                    "{} bit {} selected twice",
                    kind_name(kind),
                    index
                )));
            }
        }

        Ok(indices)
    }
}

fn lookup(space: &BitSpace, name: &str, kind: RegisterKind) -> Result<(usize, usize)> {
    space.register_span(name, kind).ok_or_else(|| {
        BreakpointError::config(format!("no {} register named '{}'", kind_name(kind), name))
    })
}

fn kind_name(kind: RegisterKind) -> &'static str {
    match kind {
        RegisterKind::Quantum => "quantum",
        RegisterKind::Classical => "classical",
    }
}

impl From<usize> for BitSelector {
    fn from(index: usize) -> Self {
        BitSelector::Index(index)
    }
}

impl From<Vec<usize>> for BitSelector {
    fn from(indices: Vec<usize>) -> Self {
        BitSelector::Indices(indices)
    }
}

impl From<&[usize]> for BitSelector {
    fn from(indices: &[usize]) -> Self {
        BitSelector::Indices(indices.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for BitSelector {
    fn from(indices: [usize; N]) -> Self {
        BitSelector::Indices(indices.to_vec())
    }
}

impl From<Range<usize>> for BitSelector {
    fn from(range: Range<usize>) -> Self {
        BitSelector::Range(range)
    }
}

impl From<RangeInclusive<usize>> for BitSelector {
    fn from(range: RangeInclusive<usize>) -> Self {
        let (start, end) = range.into_inner();
        BitSelector::Range(start..end.saturating_add(1))
    }
}

impl From<&Register> for BitSelector {
    fn from(register: &Register) -> Self {
        BitSelector::Register(register.name.clone())
    }
}

impl From<BitRef> for BitSelector {
    fn from(bit: BitRef) -> Self {
        BitSelector::Bits(vec![bit])
    }
}

impl From<Vec<BitRef>> for BitSelector {
    fn from(bits: Vec<BitRef>) -> Self {
        BitSelector::Bits(bits)
    }
}
