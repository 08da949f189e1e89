//! CFF CharString (glyph) processing.
//!
//! The flattener in this module interprets a Type 2 CharString and re-emits
//! an equivalent program with every `callsubr`/`callgsubr` inlined, so the
//! result stands alone without any subroutine INDEX. Operands are carried on
//! the interpreter stack in their original numeric form and re-encoded when
//! the operator that consumes them is flushed.

use std::fmt;

pub use argstack::ArgumentsStack;

use crate::binary::read::{ReadEof, ReadScope};
use crate::binary::write::{WriteBinary, WriteBuffer, WriteContext};
use crate::binary::{I16Be, I32Be, U8};
use crate::cff::{CFFError, Index, MAX_OPERANDS};
use crate::error::{ParseError, WriteError};

mod argstack;

// Subroutine nesting limit according to the Adobe Technical Note #5177 Appendix B.
pub(crate) const NESTING_LIMIT: u8 = 10;

pub(crate) const TWO_BYTE_OPERATOR_MARK: u8 = 12;

/// A 16.16 signed fixed-point CharString operand.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Fixed(pub i32);

// A type for holding CharString operands in their original form (int/fixed point).
#[derive(Debug, Copy, Clone)]
pub(crate) enum StackValue {
    Int(i16),
    Fixed(Fixed),
}

/// An error that occurred while flattening a CharString.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlattenError {
    Write(WriteError),
    Cff(CFFError),
}

impl From<CFFError> for FlattenError {
    fn from(err: CFFError) -> Self {
        FlattenError::Cff(err)
    }
}

impl From<ParseError> for FlattenError {
    fn from(err: ParseError) -> Self {
        FlattenError::Cff(CFFError::ParseError(err))
    }
}

impl From<ReadEof> for FlattenError {
    fn from(err: ReadEof) -> Self {
        FlattenError::Cff(CFFError::from(err))
    }
}

impl From<WriteError> for FlattenError {
    fn from(err: WriteError) -> Self {
        FlattenError::Write(err)
    }
}

impl fmt::Display for FlattenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlattenError::Write(err) => write!(f, "unable to flatten charstring: {}", err),
            FlattenError::Cff(err) => write!(f, "unable to flatten charstring: {}", err),
        }
    }
}

impl std::error::Error for FlattenError {}

/// Flatten `char_string`, inlining subroutine calls and optionally dropping
/// hints.
///
/// `local_subrs` must be the Local Subrs INDEX applicable to the glyph the
/// CharString belongs to (for CID fonts, the one belonging to the glyph's
/// Font DICT).
pub(crate) fn flatten_char_string(
    char_string: &[u8],
    local_subrs: Option<&Index<'_>>,
    global_subrs: &Index<'_>,
    drop_hints: bool,
) -> Result<Vec<u8>, FlattenError> {
    let mut flattener = Flattener {
        local_subrs,
        global_subrs,
        drop_hints,
        buffer: WriteBuffer::new(),
        stems_len: 0,
        has_endchar: false,
    };
    let mut stack = ArgumentsStack {
        data: &mut [StackValue::Int(0); MAX_OPERANDS],
        len: 0,
        max_len: MAX_OPERANDS,
    };

    flattener.flatten(char_string, 0, &mut stack)?;

    if !flattener.has_endchar {
        return Err(CFFError::MissingEndChar.into());
    }

    Ok(flattener.buffer.into_inner())
}

struct Flattener<'a, 'data> {
    local_subrs: Option<&'a Index<'data>>,
    global_subrs: &'a Index<'data>,
    drop_hints: bool,
    buffer: WriteBuffer,
    stems_len: u32,
    has_endchar: bool,
}

impl<'a, 'data> Flattener<'a, 'data> {
    fn flatten(
        &mut self,
        char_string: &[u8],
        depth: u8,
        stack: &mut ArgumentsStack<'_, StackValue>,
    ) -> Result<(), FlattenError> {
        let mut s = ReadScope::new(char_string).ctxt();
        while s.bytes_available() {
            let op = s.read::<U8>()?;
            match op {
                0 | 2 | 9 | 13 | 15 | 16 | 17 => {
                    // Reserved (15 and 16 only carry meaning in CFF2).
                    return Err(CFFError::InvalidOperator.into());
                }
                operator::HORIZONTAL_STEM
                | operator::VERTICAL_STEM
                | operator::HORIZONTAL_STEM_HINT_MASK
                | operator::VERTICAL_STEM_HINT_MASK => {
                    // The number of stem operators on the stack is always even.
                    // If the value is uneven, then the first operand is the width.
                    self.stems_len += stack.len() as u32 >> 1;

                    if self.drop_hints {
                        stack.clear();
                    } else {
                        self.flush(&[op], stack)?;
                    }
                }
                operator::VERTICAL_MOVE_TO
                | operator::LINE_TO
                | operator::HORIZONTAL_LINE_TO
                | operator::VERTICAL_LINE_TO
                | operator::CURVE_TO
                | operator::MOVE_TO
                | operator::HORIZONTAL_MOVE_TO
                | operator::CURVE_LINE
                | operator::LINE_CURVE
                | operator::VV_CURVE_TO
                | operator::HH_CURVE_TO
                | operator::VH_CURVE_TO
                | operator::HV_CURVE_TO => {
                    self.flush(&[op], stack)?;
                }
                operator::CALL_LOCAL_SUBROUTINE => {
                    if stack.is_empty() {
                        return Err(CFFError::InvalidArgumentsStackLength.into());
                    }

                    if depth == NESTING_LIMIT {
                        return Err(CFFError::NestingLimitReached.into());
                    }

                    let local_subrs = self.local_subrs.ok_or(CFFError::NoLocalSubroutines)?;
                    let subroutine_bias = calc_subroutine_bias(local_subrs.count);
                    let index = conv_subroutine_index(stack.pop(), subroutine_bias)?;
                    let char_string = local_subrs
                        .read_object(index)
                        .ok_or(CFFError::InvalidSubroutineIndex)?;
                    self.flatten(char_string, depth + 1, stack)?;

                    if self.has_endchar {
                        if s.bytes_available() {
                            return Err(CFFError::DataAfterEndChar.into());
                        }

                        break;
                    }
                }
                operator::RETURN => {
                    if depth == 0 {
                        return Err(CFFError::UnexpectedReturn.into());
                    }

                    // Pop back to the calling CharString. The operand stack is
                    // left as-is: pending operands belong to the caller's next
                    // operator.
                    break;
                }
                TWO_BYTE_OPERATOR_MARK => {
                    // flex
                    let op2 = s.read::<U8>()?;
                    match op2 {
                        operator::HFLEX | operator::FLEX | operator::HFLEX1 | operator::FLEX1 => {
                            if self.drop_hints {
                                stack.clear();
                            } else {
                                self.flush(&[TWO_BYTE_OPERATOR_MARK, op2], stack)?;
                            }
                        }
                        _ => return Err(CFFError::UnsupportedOperator.into()),
                    }
                }
                operator::ENDCHAR => {
                    // A CharString ending in a seac-style accented character
                    // leaves its operands on the stack; they are re-emitted
                    // along with the operator rather than expanded.
                    if s.bytes_available() {
                        return Err(CFFError::DataAfterEndChar.into());
                    }

                    self.has_endchar = true;
                    self.flush(&[op], stack)?;
                    break;
                }
                operator::HINT_MASK | operator::COUNTER_MASK => {
                    // Pending operands are implicit vstem hints.
                    self.stems_len += stack.len() as u32 >> 1;

                    let hints = s.read_slice(((self.stems_len + 7) >> 3) as usize)?;

                    if self.drop_hints {
                        stack.clear();
                    } else {
                        self.flush(&[op], stack)?;
                        self.buffer.write_bytes(hints)?;
                    }
                }
                operator::SHORT_INT => {
                    let n = s.read::<I16Be>()?;
                    stack.push(StackValue::Int(n))?;
                }
                operator::CALL_GLOBAL_SUBROUTINE => {
                    if stack.is_empty() {
                        return Err(CFFError::InvalidArgumentsStackLength.into());
                    }

                    if depth == NESTING_LIMIT {
                        return Err(CFFError::NestingLimitReached.into());
                    }

                    let subroutine_bias = calc_subroutine_bias(self.global_subrs.count);
                    let index = conv_subroutine_index(stack.pop(), subroutine_bias)?;
                    let char_string = self
                        .global_subrs
                        .read_object(index)
                        .ok_or(CFFError::InvalidSubroutineIndex)?;
                    self.flatten(char_string, depth + 1, stack)?;

                    if self.has_endchar {
                        if s.bytes_available() {
                            return Err(CFFError::DataAfterEndChar.into());
                        }

                        break;
                    }
                }
                32..=246 => {
                    stack.push(parse_int1(op))?;
                }
                247..=250 => {
                    let b1 = s.read::<U8>()?;
                    stack.push(parse_int2(op, b1))?;
                }
                251..=254 => {
                    let b1 = s.read::<U8>()?;
                    stack.push(parse_int3(op, b1))?;
                }
                operator::FIXED_16_16 => {
                    let n = s.read::<I32Be>()?;
                    stack.push(StackValue::Fixed(Fixed(n)))?;
                }
            }
        }

        Ok(())
    }

    /// Re-encode the operand stack followed by the operator bytes, then clear
    /// the stack.
    fn flush(
        &mut self,
        op: &[u8],
        stack: &mut ArgumentsStack<'_, StackValue>,
    ) -> Result<(), FlattenError> {
        for value in stack.all() {
            StackValue::write(&mut self.buffer, *value)?;
        }
        self.buffer.write_bytes(op)?;
        stack.clear();

        Ok(())
    }
}

impl WriteBinary for StackValue {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, val: Self) -> Result<Self::Output, WriteError> {
        match val {
            // Refer to Appendix A of Technical Note #5177 for the integer
            // encoding scheme.
            StackValue::Int(int) => {
                match int {
                    // NOTE: Casts are safe due to patterns limiting range
                    -107..=107 => U8::write(ctxt, (int + 139) as u8),
                    108..=1131 => {
                        let int = int - 108;
                        U8::write(ctxt, ((int >> 8) + 247) as u8)?;
                        U8::write(ctxt, int as u8)
                    }
                    -1131..=-108 => {
                        let int = -int - 108;
                        U8::write(ctxt, ((int >> 8) + 251) as u8)?;
                        U8::write(ctxt, int as u8)
                    }
                    _ => {
                        U8::write(ctxt, operator::SHORT_INT)?;
                        I16Be::write(ctxt, int)
                    }
                }
            }
            StackValue::Fixed(Fixed(fixed)) => {
                U8::write(ctxt, operator::FIXED_16_16)?;
                I32Be::write(ctxt, fixed)
            }
        }
    }
}

// CharString number parsing functions
fn parse_int1(op: u8) -> StackValue {
    StackValue::Int(i16::from(op) - 139)
}

fn parse_int2(op: u8, b1: u8) -> StackValue {
    let n = (i16::from(op) - 247) * 256 + i16::from(b1) + 108;
    debug_assert!((108..=1131).contains(&n));
    StackValue::Int(n)
}

fn parse_int3(op: u8, b1: u8) -> StackValue {
    let n = -(i16::from(op) - 251) * 256 - i16::from(b1) - 108;
    debug_assert!((-1131..=-108).contains(&n));
    StackValue::Int(n)
}

// Conversion from a biased subr index operand to its unbiased value
fn conv_subroutine_index(index: StackValue, bias: u16) -> Result<usize, CFFError> {
    let index = match index {
        StackValue::Int(int) => i32::from(int),
        StackValue::Fixed(_) => return Err(CFFError::InvalidSubroutineIndex),
    };
    let index = index + i32::from(bias);
    usize::try_from(index).map_err(|_| CFFError::InvalidSubroutineIndex)
}

// Adobe Technical Note #5176, Chapter 16 "Local / Global Subrs INDEXes"
pub(crate) fn calc_subroutine_bias(len: usize) -> u16 {
    if len < 1240 {
        107
    } else if len < 33900 {
        1131
    } else {
        32768
    }
}

/// Operators defined in Adobe Technical Note #5177, The Type 2 Charstring Format.
pub(crate) mod operator {
    pub const HORIZONTAL_STEM: u8 = 1;
    pub const VERTICAL_STEM: u8 = 3;
    pub const VERTICAL_MOVE_TO: u8 = 4;
    pub const LINE_TO: u8 = 5;
    pub const HORIZONTAL_LINE_TO: u8 = 6;
    pub const VERTICAL_LINE_TO: u8 = 7;
    pub const CURVE_TO: u8 = 8;
    pub const CALL_LOCAL_SUBROUTINE: u8 = 10;
    pub const RETURN: u8 = 11;
    pub const ENDCHAR: u8 = 14;
    pub const HORIZONTAL_STEM_HINT_MASK: u8 = 18;
    pub const HINT_MASK: u8 = 19;
    pub const COUNTER_MASK: u8 = 20;
    pub const MOVE_TO: u8 = 21;
    pub const HORIZONTAL_MOVE_TO: u8 = 22;
    pub const VERTICAL_STEM_HINT_MASK: u8 = 23;
    pub const CURVE_LINE: u8 = 24;
    pub const LINE_CURVE: u8 = 25;
    pub const VV_CURVE_TO: u8 = 26;
    pub const HH_CURVE_TO: u8 = 27;
    pub const SHORT_INT: u8 = 28;
    pub const CALL_GLOBAL_SUBROUTINE: u8 = 29;
    pub const VH_CURVE_TO: u8 = 30;
    pub const HV_CURVE_TO: u8 = 31;
    pub const HFLEX: u8 = 34;
    pub const FLEX: u8 = 35;
    pub const HFLEX1: u8 = 36;
    pub const FLEX1: u8 = 37;
    pub const FIXED_16_16: u8 = 255;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cff::write_index_objects;

    // Build INDEX data then parse it back as a borrowed INDEX.
    fn make_index(objects: Vec<Vec<u8>>) -> Vec<u8> {
        let mut buffer = WriteBuffer::new();
        write_index_objects(&mut buffer, &objects).unwrap();
        buffer.into_inner()
    }

    fn flatten(
        char_string: &[u8],
        local_subrs: &[u8],
        global_subrs: &[u8],
        drop_hints: bool,
    ) -> Result<Vec<u8>, FlattenError> {
        let local_subrs = ReadScope::new(local_subrs).read::<Index<'_>>().unwrap();
        let global_subrs = ReadScope::new(global_subrs).read::<Index<'_>>().unwrap();
        flatten_char_string(char_string, Some(&local_subrs), &global_subrs, drop_hints)
    }

    fn no_subrs() -> Vec<u8> {
        make_index(vec![])
    }

    #[test]
    fn test_flatten_copies_plain_char_string() {
        // 10 20 rmoveto endchar
        let char_string = [149, 159, 21, 14];
        let flat = flatten(&char_string, &no_subrs(), &no_subrs(), false).unwrap();
        assert_eq!(flat, char_string);
    }

    #[test]
    fn test_flatten_inlines_global_subr() {
        // Global subr 0 (bias 107): 10 20 rmoveto return
        let gsubrs = make_index(vec![vec![149, 159, 21, operator::RETURN]]);
        // -107 callgsubr endchar
        let char_string = [32, operator::CALL_GLOBAL_SUBROUTINE, 14];
        let flat = flatten(&char_string, &no_subrs(), &gsubrs, false).unwrap();
        assert_eq!(flat, [149, 159, 21, 14]);
    }

    #[test]
    fn test_flatten_inlines_nested_subrs() {
        // Global subr 0 calls local subr 0, which emits the move.
        let gsubrs = make_index(vec![vec![
            32,
            operator::CALL_LOCAL_SUBROUTINE,
            operator::RETURN,
        ]]);
        let lsubrs = make_index(vec![vec![149, 159, 21, operator::RETURN]]);
        let char_string = [32, operator::CALL_GLOBAL_SUBROUTINE, 14];
        let flat = flatten(&char_string, &lsubrs, &gsubrs, false).unwrap();
        assert_eq!(flat, [149, 159, 21, 14]);
    }

    #[test]
    fn test_flatten_operands_span_subr_call() {
        // The operands to the moveto are pushed before the subroutine call
        // and flushed by the operator inside it.
        let gsubrs = make_index(vec![vec![21, operator::RETURN]]);
        let char_string = [149, 159, 32, operator::CALL_GLOBAL_SUBROUTINE, 14];
        let flat = flatten(&char_string, &no_subrs(), &gsubrs, false).unwrap();
        assert_eq!(flat, [149, 159, 21, 14]);
    }

    #[test]
    fn test_flatten_subr_ending_in_endchar() {
        let gsubrs = make_index(vec![vec![149, 159, 21, operator::ENDCHAR]]);
        let char_string = [32, operator::CALL_GLOBAL_SUBROUTINE];
        let flat = flatten(&char_string, &no_subrs(), &gsubrs, false).unwrap();
        assert_eq!(flat, [149, 159, 21, 14]);
    }

    #[test]
    fn test_flatten_drop_hints() {
        // 10 20 hstem 30 40 vstem 50 60 rmoveto endchar
        let char_string = [
            149,
            159,
            operator::HORIZONTAL_STEM,
            169,
            179,
            operator::VERTICAL_STEM,
            189,
            199,
            operator::MOVE_TO,
            operator::ENDCHAR,
        ];
        let flat = flatten(&char_string, &no_subrs(), &no_subrs(), true).unwrap();
        assert_eq!(flat, [189, 199, operator::MOVE_TO, operator::ENDCHAR]);

        // Without the flag everything is preserved.
        let flat = flatten(&char_string, &no_subrs(), &no_subrs(), false).unwrap();
        assert_eq!(flat, char_string);
    }

    #[test]
    fn test_flatten_hintmask() {
        // 10 20 hstem 30 40 hintmask <mask> 50 60 rmoveto endchar
        let char_string = [
            149,
            159,
            operator::HORIZONTAL_STEM,
            169,
            179,
            operator::HINT_MASK,
            0b1100_0000,
            189,
            199,
            operator::MOVE_TO,
            operator::ENDCHAR,
        ];
        // One hstem hint plus one implicit vstem hint fit in a single mask byte.
        let flat = flatten(&char_string, &no_subrs(), &no_subrs(), false).unwrap();
        assert_eq!(flat, char_string);

        let flat = flatten(&char_string, &no_subrs(), &no_subrs(), true).unwrap();
        assert_eq!(flat, [189, 199, operator::MOVE_TO, operator::ENDCHAR]);
    }

    #[test]
    fn test_flatten_re_encodes_short_int() {
        // 28 00 0a is 10, re-encoded in the single byte form on output
        let char_string = [28, 0, 10, 159, 21, 14];
        let flat = flatten(&char_string, &no_subrs(), &no_subrs(), false).unwrap();
        assert_eq!(flat, [149, 159, 21, 14]);
    }

    #[test]
    fn test_flatten_preserves_fixed() {
        // 16.16 fixed point 0.5 vmoveto
        let char_string = [255, 0, 0, 0x80, 0, operator::VERTICAL_MOVE_TO, 14];
        let flat = flatten(&char_string, &no_subrs(), &no_subrs(), false).unwrap();
        assert_eq!(flat, char_string);
    }

    #[test]
    fn test_flatten_top_level_return() {
        let char_string = [operator::RETURN];
        match flatten(&char_string, &no_subrs(), &no_subrs(), false) {
            Err(FlattenError::Cff(CFFError::UnexpectedReturn)) => {}
            res => panic!("expected UnexpectedReturn got {:?}", res),
        }
    }

    #[test]
    fn test_flatten_missing_endchar() {
        let char_string = [149, 159, 21];
        match flatten(&char_string, &no_subrs(), &no_subrs(), false) {
            Err(FlattenError::Cff(CFFError::MissingEndChar)) => {}
            res => panic!("expected MissingEndChar got {:?}", res),
        }
    }

    #[test]
    fn test_flatten_data_after_endchar() {
        let char_string = [14, 14];
        match flatten(&char_string, &no_subrs(), &no_subrs(), false) {
            Err(FlattenError::Cff(CFFError::DataAfterEndChar)) => {}
            res => panic!("expected DataAfterEndChar got {:?}", res),
        }
    }

    #[test]
    fn test_flatten_nesting_limit() {
        // Global subr 0 calls itself
        let gsubrs = make_index(vec![vec![32, operator::CALL_GLOBAL_SUBROUTINE]]);
        let char_string = [32, operator::CALL_GLOBAL_SUBROUTINE, 14];
        match flatten(&char_string, &no_subrs(), &gsubrs, false) {
            Err(FlattenError::Cff(CFFError::NestingLimitReached)) => {}
            res => panic!("expected NestingLimitReached got {:?}", res),
        }
    }

    #[test]
    fn test_flatten_invalid_subr_index() {
        let gsubrs = make_index(vec![vec![operator::RETURN]]);
        // bias is 107 so operand 0 refers to subr 107, which doesn't exist
        let char_string = [139, operator::CALL_GLOBAL_SUBROUTINE, 14];
        match flatten(&char_string, &no_subrs(), &gsubrs, false) {
            Err(FlattenError::Cff(CFFError::InvalidSubroutineIndex)) => {}
            res => panic!("expected InvalidSubroutineIndex got {:?}", res),
        }
    }

    #[test]
    fn test_flatten_no_local_subrs() {
        let char_string = [139, operator::CALL_LOCAL_SUBROUTINE, 14];
        let global_subrs = no_subrs();
        let global_subrs = ReadScope::new(&global_subrs).read::<Index<'_>>().unwrap();
        match flatten_char_string(&char_string, None, &global_subrs, false) {
            Err(FlattenError::Cff(CFFError::NoLocalSubroutines)) => {}
            res => panic!("expected NoLocalSubroutines got {:?}", res),
        }
    }

    #[test]
    fn test_flatten_truncated_stream() {
        // shortint with only one trailing byte
        let char_string = [28, 0];
        match flatten(&char_string, &no_subrs(), &no_subrs(), false) {
            Err(FlattenError::Cff(CFFError::ParseError(_))) => {}
            res => panic!("expected ParseError got {:?}", res),
        }
    }

    #[test]
    fn test_flatten_stack_limit() {
        // 49 operands followed by rmoveto
        let mut char_string = vec![139; MAX_OPERANDS + 1];
        char_string.extend_from_slice(&[operator::MOVE_TO, operator::ENDCHAR]);
        match flatten(&char_string, &no_subrs(), &no_subrs(), false) {
            Err(FlattenError::Cff(CFFError::ArgumentsStackLimitReached)) => {}
            res => panic!("expected ArgumentsStackLimitReached got {:?}", res),
        }
    }

    #[test]
    fn test_stack_value_int_encoding_boundaries() {
        for (value, expected) in [
            (0i16, vec![139u8]),
            (-107, vec![32]),
            (107, vec![246]),
            (108, vec![247, 0]),
            (1131, vec![250, 255]),
            (-108, vec![251, 0]),
            (-1131, vec![254, 255]),
            (1132, vec![28, 0x04, 0x6c]),
            (-32768, vec![28, 0x80, 0x00]),
        ] {
            let mut buffer = WriteBuffer::new();
            StackValue::write(&mut buffer, StackValue::Int(value)).unwrap();
            assert_eq!(buffer.bytes(), expected.as_slice(), "value {}", value);
        }
    }
}
