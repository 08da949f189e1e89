//! CFF subsetting.
//!
//! Produces a new CFF table containing only a chosen subset of the input
//! font's glyphs. The work happens in two phases. [SubsetPlan::new] walks the
//! font with size calculators and fixes the complete output layout: the
//! offset and size of every sub-table, the offset size of every INDEX, the
//! remapping of every String ID and Font DICT index, and the flattened form
//! of every CharString. [SubsetPlan::write] then emits the bytes, checking at
//! every sub-table boundary that the write cursor landed exactly on the
//! planned offset. The two phases agree because every rewritten DICT operand
//! uses a value-independent encoding (see [DictDelta]).
//!
//! The output always inlines subroutines: the Global Subrs INDEX is written
//! empty and each Private DICT is followed by an empty Local Subrs INDEX, so
//! no CharString in the output references a subroutine.

use std::convert::TryFrom;
use std::fmt;

use log::debug;
use rustc_hash::FxHashMap;

use crate::binary::write::{WriteBinary, WriteBinaryDep, WriteBuffer, WriteContext, WriteCounter};
use crate::binary::{U16Be, U8};
use crate::cff::charstring::{flatten_char_string, FlattenError};
use crate::error::{ParseError, WriteError};

use super::{
    index_layout, write_index_objects, CFFError, CFFVariant, DictDelta, FDSelect, Font, FontDict, Header, Index,
    Operand, Operator, PrivateDict, Range, Supplement, TopDict, CFF, N_STD_STRINGS, SID,
};

/// CFF1 SID operands are 16-bit with the upper half reserved.
const MAX_SIDS: usize = 0x8000;

/// Top DICT operators whose operand is a SID naming a font string.
const NAME_DICT_OPERATORS: [Operator; 9] = [
    Operator::Version,
    Operator::Notice,
    Operator::Copyright,
    Operator::FullName,
    Operator::FamilyName,
    Operator::Weight,
    Operator::PostScript,
    Operator::BaseFontName,
    Operator::FontName,
];

/// An error that occurred when subsetting a CFF font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubsetError {
    /// The glyph list was empty or its first entry was not glyph 0 (`.notdef`).
    NotdefRequired,
    /// The subset retains more strings than a SID operand can address.
    SidLimitExceeded,
    /// The subset encodes more than 255 glyph codes.
    EncodingLimitExceeded,
    Parse(ParseError),
    CharString(CFFError),
    Write(WriteError),
}

impl From<ParseError> for SubsetError {
    fn from(error: ParseError) -> Self {
        SubsetError::Parse(error)
    }
}

impl From<CFFError> for SubsetError {
    fn from(error: CFFError) -> Self {
        SubsetError::CharString(error)
    }
}

impl From<WriteError> for SubsetError {
    fn from(error: WriteError) -> Self {
        SubsetError::Write(error)
    }
}

impl From<FlattenError> for SubsetError {
    fn from(error: FlattenError) -> Self {
        match error {
            FlattenError::Cff(err) => SubsetError::CharString(err),
            FlattenError::Write(err) => SubsetError::Write(err),
        }
    }
}

impl fmt::Display for SubsetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubsetError::NotdefRequired => {
                write!(f, "the first glyph of a subset must be .notdef")
            }
            SubsetError::SidLimitExceeded => write!(f, "too many strings retained"),
            SubsetError::EncodingLimitExceeded => write!(f, "too many encoded glyphs"),
            SubsetError::Parse(err) => write!(f, "subset: {}", err),
            SubsetError::CharString(err) => write!(f, "subset: {}", err),
            SubsetError::Write(err) => write!(f, "subset: {}", err),
        }
    }
}

impl std::error::Error for SubsetError {}

/// Planned location of a sub-table in the output.
#[derive(Copy, Clone, Debug, Default)]
struct TableInfo {
    offset: usize,
    size: usize,
    off_size: u8,
}

/// Offsets of every sub-table in the output, in layout order.
#[derive(Default)]
struct SubsetOffsets {
    name_index: usize,
    top_dict: TableInfo,
    string_index: TableInfo,
    global_subrs: usize,
    encoding: usize,
    charset: TableInfo,
    fd_select: TableInfo,
    fd_array: TableInfo,
    char_strings: TableInfo,
    /// Per retained Font DICT, in dense order. The size covers the Private
    /// DICT only; its empty Local Subrs INDEX follows it immediately.
    private_dicts: Vec<TableInfo>,
}

/// A compacting renumbering of String IDs.
///
/// Standard SIDs (below 391) are fixed points. Non-standard SIDs are assigned
/// dense indices in first-add order, which is also the order the retained
/// strings appear in the output String INDEX.
struct SidRemap {
    map: FxHashMap<SID, u16>,
    order: Vec<SID>,
}

impl SidRemap {
    fn new() -> Self {
        SidRemap {
            map: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Add `sid` to the remap (idempotent), returning its remapped value.
    fn add(&mut self, sid: SID) -> SID {
        if sid < N_STD_STRINGS {
            return sid;
        }

        match self.map.get(&sid) {
            Some(&dense) => N_STD_STRINGS + dense,
            None => {
                let dense = self.order.len() as u16;
                self.map.insert(sid, dense);
                self.order.push(sid);
                N_STD_STRINGS + dense
            }
        }
    }

    /// Look up a previously added SID without mutating the remap.
    fn lookup(&self, sid: SID) -> SID {
        if sid < N_STD_STRINGS {
            sid
        } else {
            self.map
                .get(&sid)
                .map_or(sid, |&dense| N_STD_STRINGS + dense)
        }
    }

    /// The number of retained non-standard SIDs.
    fn len(&self) -> usize {
        self.order.len()
    }

    /// The retained original SIDs in dense order.
    fn retained(&self) -> &[SID] {
        &self.order
    }
}

/// A compacting renumbering of Font DICT indices.
///
/// Dense indices are assigned in first-add order over the subset glyph walk;
/// the FDArray and Private DICTs are emitted in the same order, so FDSelect
/// values always match FDArray positions. FDs used by no retained glyph are
/// never added and report `None`.
struct FdRemap {
    map: FxHashMap<u8, u8>,
    order: Vec<u8>,
}

impl FdRemap {
    fn new() -> Self {
        FdRemap {
            map: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    fn add(&mut self, fd: u8) -> u8 {
        match self.map.get(&fd) {
            Some(&dense) => dense,
            None => {
                let dense = self.order.len() as u8;
                self.map.insert(fd, dense);
                self.order.push(fd);
                dense
            }
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    /// The retained original FDs in dense order.
    fn old_fds(&self) -> &[u8] {
        &self.order
    }
}

/// Accumulates `(first_value, first_glyph)` pairs while walking the subset
/// glyphs in output order. `finalize` rewrites each pair's glyph field into
/// the range's `nLeft` count.
struct RangeList {
    ranges: Vec<Range<u16, u16>>,
}

impl RangeList {
    fn new() -> Self {
        RangeList { ranges: Vec::new() }
    }

    fn push(&mut self, first: u16, glyph: u16) {
        // n_left temporarily holds the first glyph of the range
        self.ranges.push(Range {
            first,
            n_left: glyph,
        });
    }

    /// Replace the first-glyph field of each range with its nLeft value,
    /// scanning right to left so each range can use the next range's first
    /// glyph. Returns the largest nLeft encountered.
    fn finalize(&mut self, mut last_glyph: u16) -> u16 {
        let mut max_n_left = 0;
        for range in self.ranges.iter_mut().rev() {
            let n_left = last_glyph - range.n_left - 1;
            last_glyph = range.n_left;
            range.n_left = n_left;
            max_n_left = max_n_left.max(n_left);
        }

        max_n_left
    }

    fn len(&self) -> usize {
        self.ranges.len()
    }

    fn iter(&self) -> impl Iterator<Item = &Range<u16, u16>> {
        self.ranges.iter()
    }
}

/// The subset Encoding, chosen between formats 0 and 1 by serialized size.
struct EncodingPlan {
    format: u8,
    /// Code per glyph, starting at glyph 1. Glyphs from the first one without
    /// a code onwards are left unencoded.
    codes: Vec<u8>,
    ranges: RangeList,
    /// Supplemental code assignments, holding original SIDs; they are
    /// remapped as the encoding is written.
    supplements: Vec<Supplement>,
}

impl EncodingPlan {
    fn serialized_size(&self) -> usize {
        let mut size = match self.format {
            0 => 2 + self.codes.len(),
            _ => 2 + 2 * self.ranges.len(),
        };
        if !self.supplements.is_empty() {
            size += 1 + 3 * self.supplements.len();
        }

        size
    }

    fn write<C: WriteContext>(&self, ctxt: &mut C, sid_remap: &SidRemap) -> Result<(), WriteError> {
        let supplemented = if self.supplements.is_empty() { 0 } else { 0x80 };
        U8::write(ctxt, self.format | supplemented)?;

        match self.format {
            0 => {
                U8::write(ctxt, u8::try_from(self.codes.len())?)?;
                for &code in &self.codes {
                    U8::write(ctxt, code)?;
                }
            }
            _ => {
                U8::write(ctxt, u8::try_from(self.ranges.len())?)?;
                for range in self.ranges.iter() {
                    Range::write(
                        ctxt,
                        Range {
                            first: u8::try_from(range.first)?,
                            n_left: u8::try_from(range.n_left)?,
                        },
                    )?;
                }
            }
        }

        if !self.supplements.is_empty() {
            U8::write(ctxt, u8::try_from(self.supplements.len())?)?;
            for supplement in &self.supplements {
                Supplement::write(
                    ctxt,
                    Supplement {
                        code: supplement.code,
                        sid: sid_remap.lookup(supplement.sid),
                    },
                )?;
            }
        }

        Ok(())
    }
}

/// The subset Charset, chosen between formats 0, 1, and 2 by serialized size.
/// Format 2 is only selected when some range's nLeft exceeds a byte.
struct CharsetPlan {
    format: u8,
    /// SID (or CID) per glyph, starting at glyph 1, already remapped.
    sids: Vec<SID>,
    ranges: RangeList,
}

impl CharsetPlan {
    fn serialized_size(&self) -> usize {
        match self.format {
            0 => 1 + 2 * self.sids.len(),
            1 => 1 + 3 * self.ranges.len(),
            _ => 1 + 4 * self.ranges.len(),
        }
    }

    fn write<C: WriteContext>(&self, ctxt: &mut C) -> Result<(), WriteError> {
        U8::write(ctxt, self.format)?;

        match self.format {
            0 => {
                for &sid in &self.sids {
                    U16Be::write(ctxt, sid)?;
                }
            }
            1 => {
                for range in self.ranges.iter() {
                    Range::write(
                        ctxt,
                        Range {
                            first: range.first,
                            n_left: u8::try_from(range.n_left)?,
                        },
                    )?;
                }
            }
            _ => {
                for range in self.ranges.iter() {
                    Range::write(ctxt, *range)?;
                }
            }
        }

        Ok(())
    }
}

/// The subset FDSelect, re-encoded over the subset glyph order and chosen
/// between formats 0 and 3 by serialized size.
struct FdSelectPlan {
    format: u8,
    /// Dense FD per subset glyph.
    fds: Vec<u8>,
    /// `(first glyph, dense FD)` ranges for format 3.
    ranges: Vec<(u16, u8)>,
    sentinel: u16,
}

impl FdSelectPlan {
    fn serialized_size(&self) -> usize {
        match self.format {
            0 => 1 + self.fds.len(),
            _ => 1 + 2 + 3 * self.ranges.len() + 2,
        }
    }

    fn write<C: WriteContext>(&self, ctxt: &mut C) -> Result<(), WriteError> {
        U8::write(ctxt, self.format)?;

        match self.format {
            0 => ctxt.write_bytes(&self.fds)?,
            _ => {
                U16Be::write(ctxt, u16::try_from(self.ranges.len())?)?;
                for &(first, fd) in &self.ranges {
                    U16Be::write(ctxt, first)?;
                    U8::write(ctxt, fd)?;
                }
                U16Be::write(ctxt, self.sentinel)?;
            }
        }

        Ok(())
    }
}

/// Remapped ROS operands; the supplement operand is copied through as-is.
struct RosMod {
    registry: SID,
    ordering: SID,
    supplement: Operand,
}

/// A computed plan for subsetting a CFF font.
///
/// Created with [SubsetPlan::new], which fixes the complete layout of the
/// output, then consumed by [SubsetPlan::write], which must be passed the
/// same font the plan was created from.
pub struct SubsetPlan {
    is_cid: bool,
    subset_charset: bool,
    subset_encoding: bool,
    /// The input Top DICT plus any `charset`/`Encoding` operators the subset
    /// needs that the input lacked.
    top_dict_mod: TopDict,
    /// Remapped SIDs for the name-string operators present in the Top DICT.
    name_sids: Vec<(Operator, SID)>,
    ros: Option<RosMod>,
    sid_remap: SidRemap,
    fd_remap: FdRemap,
    /// Remapped FontName SID per retained Font DICT, in dense order.
    font_dict_names: Vec<Option<SID>>,
    fd_select: Option<FdSelectPlan>,
    encoding: Option<EncodingPlan>,
    charset: Option<CharsetPlan>,
    /// Flattened CharStrings in output glyph order.
    char_strings: Vec<Vec<u8>>,
    /// Private DICTs of the retained FDs in dense order, hint operators
    /// already removed when hints are dropped.
    private_dicts: Vec<PrivateDict>,
    offsets: SubsetOffsets,
    final_size: usize,
}

impl<'a> CFF<'a> {
    /// Subset this font to contain only the glyphs in `glyphs`.
    ///
    /// `glyphs` lists the glyph ids to retain, in the order they receive
    /// their new ids; its first entry must be glyph 0 (`.notdef`). When
    /// `drop_hints` is `true`, hinting information is stripped from the
    /// CharStrings and Private DICTs of the output.
    ///
    /// Returns the serialized subset CFF table. CFF files holding multiple
    /// fonts are subset on their first font.
    pub fn subset(&self, glyphs: &[u16], drop_hints: bool) -> Result<Vec<u8>, SubsetError> {
        let plan = SubsetPlan::new(self, glyphs, drop_hints).map_err(|err| {
            debug!("unable to plan CFF subset: {}", err);
            err
        })?;
        plan.write(self).map_err(|err| {
            debug!("unable to write CFF subset: {}", err);
            err
        })
    }
}

impl SubsetPlan {
    /// Compute the full output layout for subsetting `cff` to `glyphs`.
    pub fn new(cff: &CFF<'_>, glyphs: &[u16], drop_hints: bool) -> Result<SubsetPlan, SubsetError> {
        // Make sure .notdef is first
        if glyphs.first() != Some(&0) {
            return Err(SubsetError::NotdefRequired);
        }
        let num_glyphs = u16::try_from(glyphs.len()).map_err(|_| ParseError::LimitExceeded)?;
        let font = cff.fonts.first().ok_or(ParseError::MissingValue)?;
        let is_cid = font.is_cid_keyed();

        // Check whether the subset renumbers any glyph ids. Predefined
        // charsets and encodings can only be kept predefined if it doesn't.
        let gid_renum = glyphs
            .iter()
            .enumerate()
            .any(|(new_gid, &old_gid)| usize::from(old_gid) != new_gid);
        let subset_charset = gid_renum || !font.charset.is_predefined();
        let subset_encoding = match &font.data {
            CFFVariant::Type1(type1) => gid_renum || !type1.encoding.is_predefined(),
            CFFVariant::CID(_) => false,
        };

        let mut plan = SubsetPlan {
            is_cid,
            subset_charset,
            subset_encoding,
            top_dict_mod: font.top_dict.clone(),
            name_sids: Vec::new(),
            ros: None,
            sid_remap: SidRemap::new(),
            fd_remap: FdRemap::new(),
            font_dict_names: Vec::new(),
            fd_select: None,
            encoding: None,
            charset: None,
            char_strings: Vec::with_capacity(glyphs.len()),
            private_dicts: Vec::new(),
            offsets: SubsetOffsets::default(),
            final_size: 0,
        };

        // CFF header and Name INDEX (copied verbatim)
        plan.final_size = 4;
        plan.offsets.name_index = plan.final_size;
        plan.final_size += cff.name_index.serialized_size();

        // Top DICT INDEX. The size is computed now, with placeholder operand
        // values, and must not change once the real offsets and SIDs are
        // known; the delta operands are fixed-width to guarantee that.
        if plan.subset_encoding && !plan.top_dict_mod.contains(Operator::Encoding) {
            plan.top_dict_mod.push(Operator::Encoding, vec![Operand::Offset(0)]);
        }
        if plan.subset_charset && !plan.top_dict_mod.contains(Operator::Charset) {
            plan.top_dict_mod.push(Operator::Charset, vec![Operand::Offset(0)]);
        }
        plan.name_sids = NAME_DICT_OPERATORS
            .iter()
            .copied()
            .filter(|&op| plan.top_dict_mod.contains(op))
            .map(|op| (op, 0))
            .collect();
        plan.ros = match plan.top_dict_mod.get(Operator::ROS) {
            Some([_registry, _ordering, supplement]) => Some(RosMod {
                registry: 0,
                ordering: 0,
                supplement: supplement.clone(),
            }),
            Some(_) => return Err(ParseError::BadValue.into()),
            None => None,
        };
        plan.offsets.top_dict.offset = plan.final_size;
        let top_dict_size = TopDict::write_dep(
            &mut WriteCounter::new(),
            &plan.top_dict_mod,
            plan.build_top_dict_delta()?,
        )?;
        let (index_size, off_size) = index_layout(1, top_dict_size)?;
        plan.offsets.top_dict.size = index_size;
        plan.offsets.top_dict.off_size = off_size;
        plan.final_size += index_size;

        // Determine the FD remap and the subset FDSelect encoding
        if let CFFVariant::CID(cid) = &font.data {
            let fd_select =
                plan_subset_fd_select(&cid.fd_select, glyphs, &mut plan.fd_remap, num_glyphs)?;
            plan.offsets.fd_select.size = fd_select.serialized_size();
            plan.fd_select = Some(fd_select);
        }

        // Collect the SIDs referenced by DICTs. These are added to the remap
        // before glyph name SIDs so they stay within 2-byte operand range.
        for (op, remapped) in plan.name_sids.iter_mut() {
            let sid = font
                .top_dict
                .get_sid(*op)
                .ok_or(ParseError::MissingValue)??;
            *remapped = plan.sid_remap.add(sid);
        }
        if let Some(ros) = plan.ros.as_mut() {
            let operands = font
                .top_dict
                .get(Operator::ROS)
                .ok_or(ParseError::MissingValue)?;
            ros.registry = plan.sid_remap.add(operand_sid(&operands[0])?);
            ros.ordering = plan.sid_remap.add(operand_sid(&operands[1])?);
        }
        if let CFFVariant::CID(cid) = &font.data {
            let old_fds = plan.fd_remap.old_fds().to_vec();
            for old_fd in old_fds {
                let font_dict = cid
                    .font_dicts
                    .get(usize::from(old_fd))
                    .ok_or(ParseError::BadIndex)?;
                let name = font_dict.get_sid(Operator::FontName).transpose()?;
                let remapped = name.map(|sid| plan.sid_remap.add(sid));
                plan.font_dict_names.push(remapped);
            }
        }
        if plan.sid_remap.len() > MAX_SIDS {
            return Err(SubsetError::SidLimitExceeded);
        }

        // Charset planning feeds the retained glyph names through the SID
        // remap, compacting them alongside the DICT strings.
        if plan.subset_charset {
            let charset =
                plan_subset_charset(font, glyphs, &mut plan.sid_remap, is_cid, num_glyphs)?;
            plan.offsets.charset.size = charset.serialized_size();
            plan.charset = Some(charset);
            if plan.sid_remap.len() > MAX_SIDS {
                return Err(SubsetError::SidLimitExceeded);
            }
        }

        // String INDEX, compacted to the retained strings
        plan.offsets.string_index.offset = plan.final_size;
        let strings_len = plan
            .sid_remap
            .retained()
            .iter()
            .map(|&sid| {
                cff.string_index
                    .read_object(usize::from(sid - N_STD_STRINGS))
                    .map(|data| data.len())
                    .ok_or(ParseError::BadIndex)
            })
            .sum::<Result<usize, _>>()?;
        let (index_size, off_size) = index_layout(plan.sid_remap.len(), strings_len)?;
        plan.offsets.string_index.size = index_size;
        plan.offsets.string_index.off_size = off_size;
        plan.final_size += index_size;

        // Flatten the CharStrings of the retained glyphs
        for &old_gid in glyphs {
            let char_string = font
                .char_strings_index
                .read_object(usize::from(old_gid))
                .ok_or(ParseError::BadIndex)?;
            let local_subrs = match &font.data {
                CFFVariant::CID(cid) => {
                    let fd = cid
                        .fd_select
                        .font_dict_index(old_gid)
                        .ok_or(ParseError::BadIndex)?;
                    cid.local_subr_indices
                        .get(usize::from(fd))
                        .ok_or(ParseError::BadIndex)?
                        .as_ref()
                }
                CFFVariant::Type1(type1) => type1.local_subr_index.as_ref(),
            };
            let flat =
                flatten_char_string(char_string, local_subrs, &cff.global_subr_index, drop_hints)?;
            plan.char_strings.push(flat);
        }

        // Global Subrs INDEX is always empty in the output
        plan.offsets.global_subrs = plan.final_size;
        plan.final_size += 2;

        // Encoding
        plan.offsets.encoding = plan.final_size;
        if plan.subset_encoding {
            let encoding = plan_subset_encoding(font, glyphs, num_glyphs)?;
            plan.final_size += encoding.serialized_size();
            plan.encoding = Some(encoding);
        }

        // Charset
        plan.offsets.charset.offset = plan.final_size;
        plan.final_size += plan.offsets.charset.size;

        // FDSelect
        if plan.fd_select.is_some() {
            plan.offsets.fd_select.offset = plan.final_size;
            plan.final_size += plan.offsets.fd_select.size;
        }

        // FDArray INDEX
        if let CFFVariant::CID(cid) = &font.data {
            plan.offsets.fd_array.offset = plan.final_size;
            let mut dicts_size = 0;
            for (dense, &old_fd) in plan.fd_remap.old_fds().iter().enumerate() {
                let font_dict = cid
                    .font_dicts
                    .get(usize::from(old_fd))
                    .ok_or(ParseError::BadIndex)?;
                let delta =
                    build_font_dict_delta(plan.font_dict_names[dense], TableInfo::default())?;
                dicts_size += FontDict::write_dep(&mut WriteCounter::new(), font_dict, delta)?;
            }
            let (index_size, off_size) = index_layout(plan.fd_remap.len(), dicts_size)?;
            plan.offsets.fd_array.size = index_size;
            plan.offsets.fd_array.off_size = off_size;
            plan.final_size += index_size;
        }

        // CharStrings INDEX
        plan.offsets.char_strings.offset = plan.final_size;
        let data_len = plan.char_strings.iter().map(|data| data.len()).sum();
        let (index_size, off_size) = index_layout(plan.char_strings.len(), data_len)?;
        plan.offsets.char_strings.size = index_size;
        plan.offsets.char_strings.off_size = off_size;
        plan.final_size += index_size;

        // Private DICTs, each followed immediately by an empty Local Subrs
        // INDEX. The Private operands in the Top DICT/FDArray can now be
        // resolved, which the delta encoding made size-neutral.
        let source_private_dicts: Vec<PrivateDict> = match &font.data {
            CFFVariant::CID(cid) => {
                let mut dicts = Vec::with_capacity(plan.fd_remap.len());
                for &old_fd in plan.fd_remap.old_fds() {
                    dicts.push(
                        cid.private_dicts
                            .get(usize::from(old_fd))
                            .ok_or(ParseError::BadIndex)?
                            .clone(),
                    );
                }
                dicts
            }
            CFFVariant::Type1(type1) => vec![type1.private_dict.clone()],
        };
        for mut private_dict in source_private_dicts {
            if drop_hints {
                private_dict.retain(|op| !is_hint_operator(op));
            }
            let delta = private_dict_delta(&private_dict, 0)?;
            let size = PrivateDict::write_dep(&mut WriteCounter::new(), &private_dict, delta)?;
            plan.offsets.private_dicts.push(TableInfo {
                offset: plan.final_size,
                size,
                off_size: 0,
            });
            plan.final_size += size + 2; // trailing empty Local Subrs INDEX
            plan.private_dicts.push(private_dict);
        }

        Ok(plan)
    }

    /// The total size in bytes of the output this plan will write.
    pub fn final_size(&self) -> usize {
        self.final_size
    }

    /// Write the subset into a new buffer of exactly [final_size](Self::final_size) bytes.
    ///
    /// `cff` must be the font this plan was created from.
    pub fn write(&self, cff: &CFF<'_>) -> Result<Vec<u8>, SubsetError> {
        let font = cff.fonts.first().ok_or(ParseError::MissingValue)?;
        let mut w = WriteBuffer::with_capacity(self.final_size);

        // Header
        let header = Header {
            major: 1,
            minor: 0,
            hdr_size: 4,
            off_size: 4,
        };
        Header::write(&mut w, &header)?;

        // Name INDEX, copied verbatim from the input
        check_offset(&w, self.offsets.name_index)?;
        Index::write(&mut w, &cff.name_index)?;

        // Top DICT INDEX
        check_offset(&w, self.offsets.top_dict.offset)?;
        let mut top_dict_data = WriteBuffer::new();
        TopDict::write_dep(&mut top_dict_data, &self.top_dict_mod, self.build_top_dict_delta()?)?;
        write_index(&mut w, &[top_dict_data.bytes()], &self.offsets.top_dict)?;

        // String INDEX
        check_offset(&w, self.offsets.string_index.offset)?;
        let strings = self
            .sid_remap
            .retained()
            .iter()
            .map(|&sid| {
                cff.string_index
                    .read_object(usize::from(sid - N_STD_STRINGS))
                    .ok_or(ParseError::BadIndex)
            })
            .collect::<Result<Vec<_>, _>>()?;
        write_index(&mut w, &strings, &self.offsets.string_index)?;

        // Global Subrs INDEX, always empty since subroutines were inlined
        check_offset(&w, self.offsets.global_subrs)?;
        U16Be::write(&mut w, 0u16)?;

        // Encoding
        if let Some(encoding) = &self.encoding {
            check_offset(&w, self.offsets.encoding)?;
            encoding.write(&mut w, &self.sid_remap)?;
        }

        // Charset
        if let Some(charset) = &self.charset {
            check_offset(&w, self.offsets.charset.offset)?;
            charset.write(&mut w)?;
        }

        // FDSelect
        if let Some(fd_select) = &self.fd_select {
            check_offset(&w, self.offsets.fd_select.offset)?;
            fd_select.write(&mut w)?;
        }

        // FDArray INDEX
        if let CFFVariant::CID(cid) = &font.data {
            check_offset(&w, self.offsets.fd_array.offset)?;
            let mut font_dicts = Vec::with_capacity(self.fd_remap.len());
            for (dense, &old_fd) in self.fd_remap.old_fds().iter().enumerate() {
                let font_dict = cid
                    .font_dicts
                    .get(usize::from(old_fd))
                    .ok_or(ParseError::BadIndex)?;
                let delta = build_font_dict_delta(
                    self.font_dict_names[dense],
                    self.offsets.private_dicts[dense],
                )?;
                let mut buffer = WriteBuffer::new();
                FontDict::write_dep(&mut buffer, font_dict, delta)?;
                font_dicts.push(buffer.into_inner());
            }
            write_index(&mut w, &font_dicts, &self.offsets.fd_array)?;
        }

        // CharStrings INDEX
        check_offset(&w, self.offsets.char_strings.offset)?;
        write_index(&mut w, &self.char_strings, &self.offsets.char_strings)?;

        // Private DICTs, each followed immediately by its empty Local Subrs
        // INDEX. The Subrs operand, if present, points just past the DICT.
        for (private_dict, info) in self.private_dicts.iter().zip(&self.offsets.private_dicts) {
            check_offset(&w, info.offset)?;
            let delta = private_dict_delta(private_dict, info.size)?;
            let written = PrivateDict::write_dep(&mut w, private_dict, delta)?;
            if written != info.size {
                debug!(
                    "private DICT serialized to {} bytes, planned {}",
                    written, info.size
                );
                return Err(WriteError::OffsetMismatch.into());
            }
            U16Be::write(&mut w, 0u16)?;
        }

        check_offset(&w, self.final_size)?;

        Ok(w.into_inner())
    }

    /// The operand rewrites applied to the Top DICT.
    ///
    /// Called once while planning, with offsets and SIDs still at their
    /// placeholder values, and once while writing, with the final values. The
    /// two deltas cover the same operators, so the serialized size is
    /// identical both times.
    fn build_top_dict_delta(&self) -> Result<DictDelta, WriteError> {
        let offsets = &self.offsets;
        let mut delta = DictDelta::new();

        if self.subset_charset {
            delta.push_offset(Operator::Charset, i32::try_from(offsets.charset.offset)?);
        }
        if self.subset_encoding {
            delta.push_offset(Operator::Encoding, i32::try_from(offsets.encoding)?);
        }
        delta.push_offset(
            Operator::CharStrings,
            i32::try_from(offsets.char_strings.offset)?,
        );
        if self.is_cid {
            delta.push_offset(Operator::FDArray, i32::try_from(offsets.fd_array.offset)?);
            delta.push_offset(Operator::FDSelect, i32::try_from(offsets.fd_select.offset)?);
        } else {
            let private = offsets.private_dicts.first().copied().unwrap_or_default();
            delta.push(
                Operator::Private,
                vec![
                    Operand::ShortInt(i16::try_from(private.size)?),
                    Operand::Offset(i32::try_from(private.offset)?),
                ],
            );
        }
        for &(op, sid) in &self.name_sids {
            // SIDs occupy the full 16-bit range; they are written as raw bits.
            delta.push_short_int(op, sid as i16);
        }
        if let Some(ros) = &self.ros {
            delta.push(
                Operator::ROS,
                vec![
                    Operand::ShortInt(ros.registry as i16),
                    Operand::ShortInt(ros.ordering as i16),
                    ros.supplement.clone(),
                ],
            );
        }

        Ok(delta)
    }
}

/// The operand rewrites applied to a Font DICT: the `FontName` SID and the
/// location of the FD's Private DICT.
fn build_font_dict_delta(
    font_name: Option<SID>,
    private_dict: TableInfo,
) -> Result<DictDelta, WriteError> {
    let mut delta = DictDelta::new();
    if let Some(sid) = font_name {
        delta.push_short_int(Operator::FontName, sid as i16);
    }
    delta.push(
        Operator::Private,
        vec![
            Operand::ShortInt(i16::try_from(private_dict.size)?),
            Operand::Offset(i32::try_from(private_dict.offset)?),
        ],
    );

    Ok(delta)
}

/// The operand rewrite applied to a Private DICT: the `Subrs` offset becomes
/// the size of the DICT itself, since its Local Subrs INDEX directly follows it.
fn private_dict_delta(private_dict: &PrivateDict, size: usize) -> Result<DictDelta, WriteError> {
    let mut delta = DictDelta::new();
    if private_dict.contains(Operator::Subrs) {
        delta.push_short_int(Operator::Subrs, i16::try_from(size)?);
    }

    Ok(delta)
}

/// Private DICT operators carrying hinting information, dropped when the
/// subset strips hints.
fn is_hint_operator(op: Operator) -> bool {
    matches!(
        op,
        Operator::BlueValues
            | Operator::OtherBlues
            | Operator::FamilyBlues
            | Operator::FamilyOtherBlues
            | Operator::StdHW
            | Operator::StdVW
            | Operator::StemSnapH
            | Operator::StemSnapV
            | Operator::BlueScale
            | Operator::BlueShift
            | Operator::BlueFuzz
            | Operator::ForceBold
            | Operator::LanguageGroup
            | Operator::ExpansionFactor
    )
}

fn operand_sid(operand: &Operand) -> Result<SID, ParseError> {
    match operand {
        Operand::Integer(value) => SID::try_from(*value).map_err(ParseError::from),
        Operand::ShortInt(value) => SID::try_from(*value).map_err(ParseError::from),
        _ => Err(ParseError::BadValue),
    }
}

fn check_offset<C: WriteContext>(ctxt: &C, planned: usize) -> Result<(), WriteError> {
    if ctxt.bytes_written() == planned {
        Ok(())
    } else {
        debug!(
            "write cursor at {}, planned sub-table offset {}",
            ctxt.bytes_written(),
            planned
        );
        Err(WriteError::OffsetMismatch)
    }
}

/// Serialise an INDEX, checking the offset size it picked against the plan.
fn write_index<C: WriteContext, T: AsRef<[u8]>>(
    ctxt: &mut C,
    objects: &[T],
    planned: &TableInfo,
) -> Result<(), WriteError> {
    let off_size = write_index_objects(ctxt, objects)?;
    if off_size == planned.off_size {
        Ok(())
    } else {
        debug!(
            "INDEX offset size {}, planned {}",
            off_size, planned.off_size
        );
        Err(WriteError::OffsetMismatch)
    }
}

/// Walk the retained glyphs in output order, remapping the FD of each and
/// choosing the smaller of FDSelect formats 0 and 3.
fn plan_subset_fd_select(
    fd_select: &FDSelect<'_>,
    glyphs: &[u16],
    fd_remap: &mut FdRemap,
    num_glyphs: u16,
) -> Result<FdSelectPlan, SubsetError> {
    let mut fds = Vec::with_capacity(glyphs.len());
    let mut ranges: Vec<(u16, u8)> = Vec::new();
    let mut last_fd = None;

    for (new_gid, &old_gid) in glyphs.iter().enumerate() {
        let fd = fd_select
            .font_dict_index(old_gid)
            .ok_or(ParseError::BadIndex)?;
        let fd = fd_remap.add(fd);
        fds.push(fd);

        if last_fd != Some(fd) {
            ranges.push((new_gid as u16, fd));
        }
        last_fd = Some(fd);
    }

    let size0 = 1 + fds.len();
    let size3 = 1 + 2 + 3 * ranges.len() + 2;
    let format = if size0 < size3 { 0 } else { 3 };

    Ok(FdSelectPlan {
        format,
        fds,
        ranges,
        sentinel: num_glyphs,
    })
}

/// Walk the retained glyphs in output order collecting their codes and
/// supplemental codes, and choose the smaller of Encoding formats 0 and 1.
///
/// Glyphs without a code end the walk; they stay in the font unencoded.
fn plan_subset_encoding(
    font: &Font<'_>,
    glyphs: &[u16],
    num_glyphs: u16,
) -> Result<EncodingPlan, SubsetError> {
    let encoding = match &font.data {
        CFFVariant::Type1(type1) => &type1.encoding,
        CFFVariant::CID(_) => return Err(ParseError::BadValue.into()),
    };

    let mut codes = Vec::with_capacity(glyphs.len().saturating_sub(1));
    let mut ranges = RangeList::new();
    let mut supplements = Vec::new();
    let mut last_code: Option<u8> = None;
    let mut end_glyph = num_glyphs;

    for (new_gid, &old_gid) in glyphs.iter().enumerate().skip(1) {
        let sid = font
            .charset
            .id_for_glyph(old_gid)
            .ok_or(ParseError::BadIndex)?;
        let code = match encoding.code_for_glyph(old_gid, sid) {
            Some(code) => code,
            None => {
                end_glyph = new_gid as u16;
                break;
            }
        };

        codes.push(code);
        if last_code.map(|last| u16::from(last) + 1) != Some(u16::from(code)) {
            ranges.push(u16::from(code), new_gid as u16);
        }
        last_code = Some(code);

        for supp_code in encoding.supplement_codes(sid) {
            supplements.push(Supplement {
                code: supp_code,
                sid,
            });
        }
    }

    ranges.finalize(end_glyph);

    if codes.len() > 255 {
        return Err(SubsetError::EncodingLimitExceeded);
    }

    let size0 = 2 + codes.len();
    let size1 = 2 + 2 * ranges.len();
    let format = if size0 <= size1 { 0 } else { 1 };

    Ok(EncodingPlan {
        format,
        codes,
        ranges,
        supplements,
    })
}

/// Walk the retained glyphs in output order collecting their SIDs (remapped,
/// for non-CID fonts) or CIDs, and choose among Charset formats 0, 1, and 2.
fn plan_subset_charset(
    font: &Font<'_>,
    glyphs: &[u16],
    sid_remap: &mut SidRemap,
    is_cid: bool,
    num_glyphs: u16,
) -> Result<CharsetPlan, SubsetError> {
    let mut sids = Vec::with_capacity(glyphs.len().saturating_sub(1));
    let mut ranges = RangeList::new();
    let mut last_sid: Option<SID> = None;

    for (new_gid, &old_gid) in glyphs.iter().enumerate().skip(1) {
        let mut sid = font
            .charset
            .id_for_glyph(old_gid)
            .ok_or(ParseError::BadIndex)?;
        // CID charsets hold CIDs, which are not string ids and aren't remapped.
        if !is_cid {
            sid = sid_remap.add(sid);
        }

        sids.push(sid);
        if last_sid.map(|last| u32::from(last) + 1) != Some(u32::from(sid)) {
            ranges.push(sid, new_gid as u16);
        }
        last_sid = Some(sid);
    }

    let max_n_left = ranges.finalize(num_glyphs);
    let two_byte = max_n_left > 255;

    let size0 = 1 + 2 * sids.len();
    let size_ranges = if two_byte {
        1 + 4 * ranges.len()
    } else {
        1 + 3 * ranges.len()
    };
    let format = if size0 < size_ranges {
        0
    } else if !two_byte {
        1
    } else {
        2
    };

    Ok(CharsetPlan {
        format,
        sids,
        ranges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::cff::write_index_objects;
    use crate::cff::{Charset, CustomCharset, Encoding, Type1Data};

    fn parse(data: &[u8]) -> CFF<'_> {
        ReadScope::new(data).read::<CFF<'_>>().unwrap()
    }

    fn expect_type1<'a, 'data>(font: &'a Font<'data>) -> &'a Type1Data<'data> {
        match &font.data {
            CFFVariant::Type1(type1) => type1,
            CFFVariant::CID(_) => panic!("expected a Type 1 font"),
        }
    }

    struct EncodingSpec {
        codes: Vec<u8>,
        supplements: Vec<(u8, u16)>,
    }

    struct Type1FontSpec {
        char_strings: Vec<Vec<u8>>,
        global_subrs: Vec<Vec<u8>>,
        local_subrs: Vec<Vec<u8>>,
        /// SID per glyph, starting at glyph 1
        charset_sids: Vec<u16>,
        /// Contents of the String INDEX (SIDs 391 onwards)
        strings: Vec<String>,
        encoding: Option<EncodingSpec>,
        version_sid: Option<u16>,
        hints: bool,
    }

    impl Default for Type1FontSpec {
        fn default() -> Self {
            Type1FontSpec {
                char_strings: vec![vec![14]],
                global_subrs: Vec::new(),
                local_subrs: Vec::new(),
                charset_sids: Vec::new(),
                strings: Vec::new(),
                encoding: None,
                version_sid: None,
                hints: false,
            }
        }
    }

    /// Assemble a Type 1 CFF font. Offsets settle after the first pass since
    /// offset operands are written in their fixed-width form.
    fn build_type1_font(spec: &Type1FontSpec) -> Vec<u8> {
        assert_eq!(spec.charset_sids.len(), spec.char_strings.len() - 1);

        let mut charset_offset = 0i32;
        let mut encoding_offset = 0i32;
        let mut char_strings_offset = 0i32;
        let mut private_offset = 0i32;
        let mut private_size = 0i32;
        let mut font = Vec::new();

        for _pass in 0..2 {
            let mut w = WriteBuffer::new();
            let header = Header {
                major: 1,
                minor: 0,
                hdr_size: 4,
                off_size: 4,
            };
            Header::write(&mut w, &header).unwrap();
            write_index_objects(&mut w, &[b"TestFont".as_slice()]).unwrap();

            let mut top_dict = TopDict::new();
            if let Some(sid) = spec.version_sid {
                top_dict.push(Operator::Version, vec![Operand::Integer(i32::from(sid))]);
            }
            top_dict.push(Operator::Charset, vec![Operand::Offset(charset_offset)]);
            if spec.encoding.is_some() {
                top_dict.push(Operator::Encoding, vec![Operand::Offset(encoding_offset)]);
            }
            top_dict.push(
                Operator::CharStrings,
                vec![Operand::Offset(char_strings_offset)],
            );
            top_dict.push(
                Operator::Private,
                vec![
                    Operand::Offset(private_size),
                    Operand::Offset(private_offset),
                ],
            );
            let mut top_dict_data = WriteBuffer::new();
            TopDict::write_dep(&mut top_dict_data, &top_dict, DictDelta::new()).unwrap();
            write_index_objects(&mut w, &[top_dict_data.bytes()]).unwrap();

            let strings: Vec<&[u8]> = spec.strings.iter().map(|s| s.as_bytes()).collect();
            write_index_objects(&mut w, &strings).unwrap();
            write_index_objects(&mut w, &spec.global_subrs).unwrap();

            if let Some(encoding) = &spec.encoding {
                encoding_offset = w.len() as i32;
                let format = if encoding.supplements.is_empty() { 0u8 } else { 0x80 };
                U8::write(&mut w, format).unwrap();
                U8::write(&mut w, encoding.codes.len() as u8).unwrap();
                for &code in &encoding.codes {
                    U8::write(&mut w, code).unwrap();
                }
                if !encoding.supplements.is_empty() {
                    U8::write(&mut w, encoding.supplements.len() as u8).unwrap();
                    for &(code, sid) in &encoding.supplements {
                        U8::write(&mut w, code).unwrap();
                        U16Be::write(&mut w, sid).unwrap();
                    }
                }
            }

            charset_offset = w.len() as i32;
            U8::write(&mut w, 0u8).unwrap(); // format 0
            for &sid in &spec.charset_sids {
                U16Be::write(&mut w, sid).unwrap();
            }

            char_strings_offset = w.len() as i32;
            write_index_objects(&mut w, &spec.char_strings).unwrap();

            private_offset = w.len() as i32;
            let mut private_dict = PrivateDict::new();
            if spec.hints {
                private_dict.push(
                    Operator::BlueValues,
                    vec![Operand::Integer(-15), Operand::Integer(0)],
                );
                private_dict.push(Operator::StdHW, vec![Operand::Integer(60)]);
                private_dict.push(Operator::StdVW, vec![Operand::Integer(80)]);
            }
            private_dict.push(Operator::DefaultWidthX, vec![Operand::Integer(500)]);
            if !spec.local_subrs.is_empty() {
                // Local subrs follow the Private DICT directly
                private_dict.push(Operator::Subrs, vec![Operand::Offset(private_size)]);
            }
            let mut private_data = WriteBuffer::new();
            PrivateDict::write_dep(&mut private_data, &private_dict, DictDelta::new()).unwrap();
            private_size = private_data.len() as i32;
            w.write_bytes(private_data.bytes()).unwrap();
            if !spec.local_subrs.is_empty() {
                write_index_objects(&mut w, &spec.local_subrs).unwrap();
            }

            font = w.into_inner();
        }

        font
    }

    fn three_glyph_font() -> Type1FontSpec {
        Type1FontSpec {
            char_strings: vec![
                vec![14],
                vec![149, 159, 21, 14],
                vec![169, 179, 21, 14],
                vec![189, 199, 21, 14],
            ],
            charset_sids: vec![391, 392, 393],
            strings: vec!["one".to_owned(), "two".to_owned(), "three".to_owned()],
            ..Type1FontSpec::default()
        }
    }

    /// A CID font with 13 glyphs and three Font DICTs. Glyph 11 draws
    /// through a local subroutine of its FD. `fd_ranges` holds FDSelect
    /// format 3 ranges over the original glyph ids.
    fn build_cid_font(fd_ranges: &[(u16, u8)]) -> Vec<u8> {
        const NUM_GLYPHS: u16 = 13;
        let char_strings: Vec<Vec<u8>> = (0..NUM_GLYPHS)
            .map(|gid| {
                if gid == 11 {
                    vec![32, 10, 14] // -107 callsubr endchar
                } else {
                    vec![149, 139 + gid as u8, 21, 14]
                }
            })
            .collect();
        let local_subrs = vec![vec![149u8, 159, 21, 11]]; // 10 20 rmoveto return

        let mut charset_offset = 0i32;
        let mut char_strings_offset = 0i32;
        let mut fd_array_offset = 0i32;
        let mut fd_select_offset = 0i32;
        let mut private_info = [(0i32, 0i32); 3]; // (size, offset) per FD
        let mut font = Vec::new();

        for _pass in 0..2 {
            let mut w = WriteBuffer::new();
            let header = Header {
                major: 1,
                minor: 0,
                hdr_size: 4,
                off_size: 4,
            };
            Header::write(&mut w, &header).unwrap();
            write_index_objects(&mut w, &[b"TestCID".as_slice()]).unwrap();

            let mut top_dict = TopDict::new();
            top_dict.push(
                Operator::ROS,
                vec![
                    Operand::Integer(391),
                    Operand::Integer(392),
                    Operand::Integer(0),
                ],
            );
            top_dict.push(
                Operator::CIDCount,
                vec![Operand::Integer(i32::from(NUM_GLYPHS))],
            );
            top_dict.push(Operator::Charset, vec![Operand::Offset(charset_offset)]);
            top_dict.push(
                Operator::CharStrings,
                vec![Operand::Offset(char_strings_offset)],
            );
            top_dict.push(Operator::FDArray, vec![Operand::Offset(fd_array_offset)]);
            top_dict.push(Operator::FDSelect, vec![Operand::Offset(fd_select_offset)]);
            let mut top_dict_data = WriteBuffer::new();
            TopDict::write_dep(&mut top_dict_data, &top_dict, DictDelta::new()).unwrap();
            write_index_objects(&mut w, &[top_dict_data.bytes()]).unwrap();

            // Registry, ordering, and one FontName per FD
            let strings: Vec<&[u8]> = vec![b"Adobe", b"Identity", b"Fd0", b"Fd1", b"Fd2"];
            write_index_objects(&mut w, &strings).unwrap();
            let no_subrs: [Vec<u8>; 0] = [];
            write_index_objects(&mut w, &no_subrs).unwrap();

            charset_offset = w.len() as i32;
            U8::write(&mut w, 0u8).unwrap(); // format 0, CIDs match glyph ids
            for cid in 1..NUM_GLYPHS {
                U16Be::write(&mut w, cid).unwrap();
            }

            fd_select_offset = w.len() as i32;
            U8::write(&mut w, 3u8).unwrap();
            U16Be::write(&mut w, fd_ranges.len() as u16).unwrap();
            for &(first, fd) in fd_ranges {
                U16Be::write(&mut w, first).unwrap();
                U8::write(&mut w, fd).unwrap();
            }
            U16Be::write(&mut w, NUM_GLYPHS).unwrap();

            fd_array_offset = w.len() as i32;
            let mut font_dicts = Vec::new();
            for (fd, &(size, offset)) in private_info.iter().enumerate() {
                let mut font_dict = FontDict::new();
                font_dict.push(
                    Operator::FontName,
                    vec![Operand::Integer(393 + fd as i32)],
                );
                font_dict.push(
                    Operator::Private,
                    vec![Operand::Offset(size), Operand::Offset(offset)],
                );
                let mut data = WriteBuffer::new();
                FontDict::write_dep(&mut data, &font_dict, DictDelta::new()).unwrap();
                font_dicts.push(data.into_inner());
            }
            write_index_objects(&mut w, &font_dicts).unwrap();

            char_strings_offset = w.len() as i32;
            write_index_objects(&mut w, &char_strings).unwrap();

            for fd in 0..3 {
                let offset = w.len() as i32;
                let mut private_dict = PrivateDict::new();
                private_dict.push(
                    Operator::NominalWidthX,
                    vec![Operand::Integer(10 * (fd as i32 + 1))],
                );
                private_dict.push(Operator::Subrs, vec![Operand::Offset(private_info[fd].0)]);
                let mut data = WriteBuffer::new();
                PrivateDict::write_dep(&mut data, &private_dict, DictDelta::new()).unwrap();
                private_info[fd] = (data.len() as i32, offset);
                w.write_bytes(data.bytes()).unwrap();
                write_index_objects(&mut w, &local_subrs).unwrap();
            }

            font = w.into_inner();
        }

        font
    }

    #[test]
    fn test_sid_remap() {
        let mut remap = SidRemap::new();

        // Standard SIDs are fixed points
        assert_eq!(remap.add(0), 0);
        assert_eq!(remap.add(390), 390);

        // Non-standard SIDs compact in first-add order
        assert_eq!(remap.add(500), 391);
        assert_eq!(remap.add(395), 392);
        assert_eq!(remap.add(500), 391); // idempotent
        assert_eq!(remap.lookup(395), 392);
        assert_eq!(remap.retained(), &[500, 395]);
        assert_eq!(remap.len(), 2);
    }

    #[test]
    fn test_fd_remap() {
        let mut remap = FdRemap::new();
        assert_eq!(remap.add(2), 0);
        assert_eq!(remap.add(0), 1);
        assert_eq!(remap.add(2), 0);
        assert_eq!(remap.old_fds(), &[2, 0]);
    }

    #[test]
    fn test_range_list_finalize() {
        // Charset SIDs 391..=393 and 395 over glyphs 1..=4
        let mut ranges = RangeList::new();
        ranges.push(391, 1);
        ranges.push(395, 4);
        let max_n_left = ranges.finalize(5);

        let finalized: Vec<_> = ranges.iter().copied().collect();
        assert_eq!(
            finalized,
            vec![
                Range {
                    first: 391,
                    n_left: 2
                },
                Range {
                    first: 395,
                    n_left: 0
                }
            ]
        );
        assert_eq!(max_n_left, 2);
    }

    #[test]
    fn test_subset_requires_notdef_first() {
        let font_data = build_type1_font(&three_glyph_font());
        let cff = parse(&font_data);

        assert_eq!(
            SubsetPlan::new(&cff, &[], false).err(),
            Some(SubsetError::NotdefRequired)
        );
        assert_eq!(
            SubsetPlan::new(&cff, &[1, 0], false).err(),
            Some(SubsetError::NotdefRequired)
        );
    }

    #[test]
    fn test_subset_identity() {
        let font_data = build_type1_font(&three_glyph_font());
        let cff = parse(&font_data);

        let plan = SubsetPlan::new(&cff, &[0, 1, 2, 3], false).unwrap();
        let out = plan.write(&cff).unwrap();
        assert_eq!(out.len(), plan.final_size());

        let sub = parse(&out);
        let font = &sub.fonts[0];
        assert_eq!(font.char_strings_index.count, 4);
        for gid in 0..4 {
            assert_eq!(
                font.char_strings_index.read_object(gid),
                cff.fonts[0].char_strings_index.read_object(gid)
            );
        }

        // Subroutine indexes are empty in the output
        assert_eq!(sub.global_subr_index.count, 0);

        // Glyph names survive the subset
        assert_eq!(sub.string_index.count, 3);
        for (gid, name) in [(1, "one"), (2, "two"), (3, "three")] {
            let sid = font.charset.id_for_glyph(gid).unwrap();
            assert_eq!(sub.read_string(sid).unwrap(), name);
        }

        // The standard encoding stays predefined
        assert!(matches!(expect_type1(font).encoding, Encoding::Standard));
    }

    #[test]
    fn test_subset_reorder() {
        // Standard-named glyphs so the standard encoding supplies codes
        let spec = Type1FontSpec {
            charset_sids: vec![34, 35, 36], // A B C
            strings: Vec::new(),
            ..three_glyph_font()
        };
        let font_data = build_type1_font(&spec);
        let cff = parse(&font_data);

        let out = cff.subset(&[0, 3, 1], false).unwrap();
        let sub = parse(&out);
        let font = &sub.fonts[0];

        assert_eq!(font.char_strings_index.count, 3);
        assert_eq!(
            font.char_strings_index.read_object(1),
            cff.fonts[0].char_strings_index.read_object(3)
        );
        assert_eq!(
            font.char_strings_index.read_object(2),
            cff.fonts[0].char_strings_index.read_object(1)
        );

        // The charset follows the new glyph order
        assert_eq!(font.charset.id_for_glyph(1), Some(36));
        assert_eq!(font.charset.id_for_glyph(2), Some(34));
        assert_eq!(sub.string_index.count, 0);

        // Renumbering forces the encoding to be re-emitted
        let type1 = expect_type1(font);
        assert!(matches!(type1.encoding, Encoding::Custom(_)));
        assert_eq!(type1.encoding.code_for_glyph(1, 36), Some(67)); // 'C'
        assert_eq!(type1.encoding.code_for_glyph(2, 34), Some(65)); // 'A'
    }

    #[test]
    fn test_subset_compacts_strings() {
        let font_data = build_type1_font(&three_glyph_font());
        let cff = parse(&font_data);

        let out = cff.subset(&[0, 2], false).unwrap();
        let sub = parse(&out);

        // Only the name of the retained glyph remains, renumbered to the
        // first non-standard SID
        assert_eq!(sub.string_index.count, 1);
        assert_eq!(sub.fonts[0].charset.id_for_glyph(1), Some(391));
        assert_eq!(sub.read_string(391).unwrap(), "two");
    }

    #[test]
    fn test_subset_inlines_subroutines() {
        let mut spec = three_glyph_font();
        // Glyph 1: -107 callgsubr endchar
        spec.char_strings[1] = vec![32, 29, 14];
        // Global subr 0 calls local subr 0 which draws the move
        spec.global_subrs = vec![vec![32, 10, 11]];
        spec.local_subrs = vec![vec![149, 159, 21, 11]];
        let font_data = build_type1_font(&spec);
        let cff = parse(&font_data);

        let out = cff.subset(&[0, 1], false).unwrap();
        let sub = parse(&out);
        let font = &sub.fonts[0];

        assert_eq!(
            font.char_strings_index.read_object(1),
            Some([149, 159, 21, 14].as_slice())
        );
        assert_eq!(sub.global_subr_index.count, 0);

        // The Subrs operand points directly past the Private DICT, at an
        // empty Local Subrs INDEX
        let type1 = expect_type1(font);
        let private_operands = font.top_dict.get(Operator::Private).unwrap();
        let [Operand::Offset(private_size), Operand::Offset(_)] = private_operands else {
            panic!("expected Private size and offset");
        };
        assert_eq!(
            type1.private_dict.get_i32(Operator::Subrs),
            Some(Ok(*private_size))
        );
        assert_eq!(
            type1.local_subr_index.as_ref().map(|index| index.count),
            Some(0)
        );
    }

    #[test]
    fn test_subset_drop_hints() {
        let mut spec = three_glyph_font();
        // 10 20 hstem 30 40 vstem 50 60 rmoveto endchar
        spec.char_strings[1] = vec![149, 159, 1, 169, 179, 3, 189, 199, 21, 14];
        spec.hints = true;
        let font_data = build_type1_font(&spec);
        let cff = parse(&font_data);

        let out = cff.subset(&[0, 1], true).unwrap();
        let sub = parse(&out);
        let font = &sub.fonts[0];

        assert_eq!(
            font.char_strings_index.read_object(1),
            Some([189, 199, 21, 14].as_slice())
        );

        // Hint operators are gone from the Private DICT, everything else stays
        let private_dict = &expect_type1(font).private_dict;
        assert!(private_dict.get(Operator::BlueValues).is_none());
        assert!(private_dict.get(Operator::StdHW).is_none());
        assert!(private_dict.get(Operator::StdVW).is_none());
        assert_eq!(
            private_dict.get_i32(Operator::DefaultWidthX),
            Some(Ok(500))
        );
    }

    #[test]
    fn test_subset_cid_single_fd() {
        // Every glyph belongs to FD 2; FDs 0 and 1 drop out of the subset
        let font_data = build_cid_font(&[(0, 2)]);
        let cff = parse(&font_data);

        let plan = SubsetPlan::new(&cff, &[0, 10, 11, 12], false).unwrap();
        let out = plan.write(&cff).unwrap();
        assert_eq!(out.len(), plan.final_size());

        let sub = parse(&out);
        let font = &sub.fonts[0];
        let cid = match &font.data {
            CFFVariant::CID(cid) => cid,
            CFFVariant::Type1(_) => panic!("expected a CID font"),
        };

        assert_eq!(cid.font_dicts.len(), 1);
        assert_eq!(cid.private_dicts.len(), 1);
        for gid in 0..4 {
            assert_eq!(cid.fd_select.font_dict_index(gid), Some(0));
        }

        // The retained Font DICT is FD 2's
        let font_name = cid.font_dicts[0]
            .get_sid(Operator::FontName)
            .unwrap()
            .unwrap();
        assert_eq!(sub.read_string(font_name).unwrap(), "Fd2");
        assert_eq!(
            cid.private_dicts[0].get_i32(Operator::NominalWidthX),
            Some(Ok(30))
        );
        assert_eq!(
            cid.local_subr_indices[0].as_ref().map(|index| index.count),
            Some(0)
        );

        // ROS strings are preserved through the remap
        let ros = font.top_dict.get(Operator::ROS).unwrap();
        let [Operand::Integer(registry), Operand::Integer(ordering), Operand::Integer(0)] = ros
        else {
            panic!("expected ROS operands");
        };
        assert_eq!(sub.read_string(*registry as u16).unwrap(), "Adobe");
        assert_eq!(sub.read_string(*ordering as u16).unwrap(), "Identity");

        // CIDs pass through the charset untouched
        assert_eq!(font.charset.id_for_glyph(1), Some(10));
        assert_eq!(font.charset.id_for_glyph(3), Some(12));

        // Glyph 11's local subroutine was inlined
        assert_eq!(
            font.char_strings_index.read_object(2),
            Some([149, 159, 21, 14].as_slice())
        );
        assert_eq!(
            font.char_strings_index.read_object(1),
            Some([149, 149, 21, 14].as_slice())
        );
    }

    #[test]
    fn test_subset_cid_multiple_fds() {
        // Glyphs 0..=4 belong to FD 0, glyphs 5..=12 to FD 1
        let font_data = build_cid_font(&[(0, 0), (5, 1)]);
        let cff = parse(&font_data);

        let out = cff.subset(&[0, 5], false).unwrap();
        let sub = parse(&out);
        let cid = match &sub.fonts[0].data {
            CFFVariant::CID(cid) => cid,
            CFFVariant::Type1(_) => panic!("expected a CID font"),
        };

        // FDs keep their first-seen order
        assert_eq!(cid.font_dicts.len(), 2);
        assert_eq!(cid.fd_select.font_dict_index(0), Some(0));
        assert_eq!(cid.fd_select.font_dict_index(1), Some(1));
        for (fd, name) in [(0, "Fd0"), (1, "Fd1")] {
            let font_name = cid.font_dicts[fd].get_sid(Operator::FontName).unwrap().unwrap();
            assert_eq!(sub.read_string(font_name).unwrap(), name);
        }
        assert_eq!(
            cid.private_dicts[0].get_i32(Operator::NominalWidthX),
            Some(Ok(10))
        );
        assert_eq!(
            cid.private_dicts[1].get_i32(Operator::NominalWidthX),
            Some(Ok(20))
        );
    }

    #[test]
    fn test_subset_encoding_supplements() {
        let mut spec = three_glyph_font();
        spec.encoding = Some(EncodingSpec {
            codes: vec![65, 66, 67],
            supplements: vec![(0x82, 392)], // extra code for glyph "two"
        });
        let font_data = build_type1_font(&spec);
        let cff = parse(&font_data);

        let out = cff.subset(&[0, 2], false).unwrap();
        let sub = parse(&out);
        let font = &sub.fonts[0];

        // "two" is the only retained string so its SID compacts to 391
        assert_eq!(font.charset.id_for_glyph(1), Some(391));
        assert_eq!(sub.read_string(391).unwrap(), "two");

        let type1 = expect_type1(font);
        assert_eq!(type1.encoding.code_for_glyph(1, 391), Some(66));
        assert_eq!(type1.encoding.supplement_codes(391), vec![0x82]);
    }

    #[test]
    fn test_subset_charset_format2_for_wide_ranges() {
        // 299 consecutively-named glyphs collapse into one charset range
        // whose nLeft needs two bytes
        let num_glyphs = 300u16;
        let spec = Type1FontSpec {
            char_strings: (0..num_glyphs).map(|_| vec![14]).collect(),
            charset_sids: (1..num_glyphs).map(|gid| 391 + gid - 1).collect(),
            strings: (1..num_glyphs).map(|gid| format!("g{:03}", gid)).collect(),
            ..Type1FontSpec::default()
        };
        let font_data = build_type1_font(&spec);
        let cff = parse(&font_data);

        let glyphs: Vec<u16> = (0..num_glyphs).collect();
        let plan = SubsetPlan::new(&cff, &glyphs, false).unwrap();
        let out = plan.write(&cff).unwrap();
        assert_eq!(out.len(), plan.final_size());

        let sub = parse(&out);
        let font = &sub.fonts[0];
        assert!(matches!(
            font.charset,
            Charset::Custom(CustomCharset::Format2 { .. })
        ));
        assert_eq!(font.charset.id_for_glyph(299), Some(391 + 298));
        assert_eq!(sub.string_index.count, 299);
        assert_eq!(sub.read_string(391 + 298).unwrap(), "g299");
    }

    #[test]
    fn test_subset_keeps_version_string() {
        let mut spec = three_glyph_font();
        spec.strings.push("1.000".to_owned());
        spec.version_sid = Some(394);
        let font_data = build_type1_font(&spec);
        let cff = parse(&font_data);

        let out = cff.subset(&[0, 3], false).unwrap();
        let sub = parse(&out);

        // The version string was added to the remap before the glyph name
        let version = sub.fonts[0]
            .top_dict
            .get_sid(Operator::Version)
            .unwrap()
            .unwrap();
        assert_eq!(sub.read_string(version).unwrap(), "1.000");
        assert_eq!(version, 391);
        assert_eq!(sub.fonts[0].charset.id_for_glyph(1), Some(392));
        assert_eq!(sub.read_string(392).unwrap(), "three");
        assert_eq!(sub.string_index.count, 2);
    }

    #[test]
    fn test_subset_output_is_stable() {
        // Subsetting a subset with the identity glyph list is a fixpoint
        let font_data = build_type1_font(&three_glyph_font());
        let cff = parse(&font_data);

        let first = cff.subset(&[0, 2, 3], false).unwrap();
        let first_parsed = parse(&first);
        let second = first_parsed.subset(&[0, 1, 2], false).unwrap();

        assert_eq!(first, second);
    }
}
