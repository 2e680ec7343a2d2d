//! Frame header parsing and frame ID tables.

use tracing::warn;

use super::{decode_syncsafe, read_u16, read_u24, read_u32, TagError};

/// Frame IDs defined by ID3v2.2 (3-character identifiers).
pub const V22_FRAME_IDS: &[&str] = &[
    "BUF", "CNT", "COM", "CRA", "CRM", "ETC", "EQU", "GEO", "IPL", "LNK", "MCI",
    "MLL", "PIC", "POP", "REV", "RVA", "SLT", "STC", "TAL", "TBP", "TCM", "TCO",
    "TCR", "TDA", "TDY", "TEN", "TFT", "TIM", "TKE", "TLA", "TLE", "TMT", "TOA",
    "TOF", "TOL", "TOR", "TOT", "TP1", "TP2", "TP3", "TP4", "TPA", "TPB", "TRC",
    "TRD", "TRK", "TSI", "TSS", "TT1", "TT2", "TT3", "TXT", "TXX", "TYE", "UFI",
    "ULT", "WAF", "WAR", "WAS", "WCM", "WCP", "WPB", "WXX",
];

/// Frame IDs defined by ID3v2.3 (4-character identifiers).
pub const V23_FRAME_IDS: &[&str] = &[
    "AENC", "APIC", "COMM", "COMR", "ENCR", "EQUA", "ETCO", "GEOB", "GRID",
    "IPLS", "LINK", "MCDI", "MLLT", "OWNE", "PRIV", "PCNT", "POPM", "POSS",
    "RBUF", "RVAD", "RVRB", "SYLT", "SYTC", "TALB", "TBPM", "TCOM", "TCON",
    "TCOP", "TDAT", "TDLY", "TENC", "TEXT", "TFLT", "TIME", "TIT1", "TIT2",
    "TIT3", "TKEY", "TLAN", "TLEN", "TMED", "TOAL", "TOFN", "TOLY", "TOPE",
    "TORY", "TOWN", "TPE1", "TPE2", "TPE3", "TPE4", "TPOS", "TPUB", "TRCK",
    "TRDA", "TRSN", "TRSO", "TSIZ", "TSRC", "TSSE", "TYER", "TXXX", "UFID",
    "USER", "USLT", "WCOM", "WCOP", "WOAF", "WOAR", "WOAS", "WORS", "WPAY",
    "WPUB", "WXXX",
];

/// Frame IDs added by ID3v2.4 on top of the v2.3 set.
pub const V24_EXTRA_FRAME_IDS: &[&str] = &[
    "ASPI", "EQU2", "RVA2", "SEEK", "SIGN", "TDEN", "TDOR", "TDRC", "TDRL",
    "TDTG", "TIPL", "TMCL", "TMOO", "TPRO", "TSOA", "TSOP", "TSOT", "TSST",
];

/// Equivalent-meaning frame ID pairs across the v2.2 and v2.3 vocabularies,
/// as (v2.2 ID, v2.3 ID).
const V22_V23_FRAME_ID_PAIRS: &[(&str, &str)] = &[
    ("BUF", "RBUF"), ("CNT", "PCNT"), ("COM", "COMM"), ("CRA", "AENC"),
    ("CRM", "ENCR"), ("ETC", "ETCO"), ("EQU", "EQUA"), ("GEO", "GEOB"),
    ("IPL", "IPLS"), ("LNK", "LINK"), ("MCI", "MCDI"), ("MLL", "MLLT"),
    ("PIC", "APIC"), ("POP", "POPM"), ("REV", "RVRB"), ("RVA", "RVAD"),
    ("SLT", "SYLT"), ("STC", "SYTC"), ("TAL", "TALB"), ("TBP", "TBPM"),
    ("TCM", "TCOM"), ("TCO", "TCON"), ("TCR", "TCOP"), ("TDA", "TDAT"),
    ("TDY", "TDLY"), ("TEN", "TENC"), ("TFT", "TFLT"), ("TIM", "TIME"),
    ("TKE", "TKEY"), ("TLA", "TLAN"), ("TLE", "TLEN"), ("TMT", "TMED"),
    ("TOA", "TOPE"), ("TOF", "TOFN"), ("TOL", "TOLY"), ("TOR", "TORY"),
    ("TOT", "TOAL"), ("TP1", "TPE1"), ("TP2", "TPE2"), ("TP3", "TPE3"),
    ("TP4", "TPE4"), ("TPA", "TPOS"), ("TPB", "TPUB"), ("TRC", "TSRC"),
    ("TRD", "TRDA"), ("TRK", "TRCK"), ("TSI", "TSIZ"), ("TSS", "TSSE"),
    ("TT1", "TIT1"), ("TT2", "TIT2"), ("TT3", "TIT3"), ("TXT", "TEXT"),
    ("TXX", "TXXX"), ("TYE", "TYER"), ("UFI", "UFID"), ("ULT", "USLT"),
    ("WAF", "WOAF"), ("WAR", "WOAR"), ("WAS", "WOAS"), ("WCM", "WCOM"),
    ("WCP", "WCOP"), ("WPB", "WPUB"), ("WXX", "WXXX"),
];

/// Frame IDs with an experimental reserved first character.
const EXPERIMENTAL_FRAME_ID_PREFIXES: &[char] = &['X', 'Y', 'Z'];

/// Upgrades a v2.2 frame ID to its v2.3 equivalent, if one exists.
pub fn upgrade_frame_id(id: &str) -> Option<&'static str> {
    V22_V23_FRAME_ID_PAIRS
        .iter()
        .find(|(old, _)| *old == id)
        .map(|(_, new)| *new)
}

fn valid_ids(version: u8) -> &'static [&'static str] {
    match version {
        2 => V22_FRAME_IDS,
        _ => V23_FRAME_IDS,
    }
}

fn is_known_id(version: u8, id: &str) -> bool {
    if valid_ids(version).contains(&id) {
        return true;
    }
    version == 4 && V24_EXTRA_FRAME_IDS.contains(&id)
}

/// The text frame ID carrying a given well-known field in each generation.
pub fn text_frame_id(version: u8, field: TextField) -> &'static str {
    match (version, field) {
        (2, TextField::Artist) => "TP1",
        (2, TextField::Album) => "TAL",
        (2, TextField::Title) => "TT2",
        (2, TextField::Track) => "TRK",
        (2, TextField::Year) => "TYE",
        (_, TextField::Artist) => "TPE1",
        (_, TextField::Album) => "TALB",
        (_, TextField::Title) => "TIT2",
        (_, TextField::Track) => "TRCK",
        (_, TextField::Year) => "TYER",
    }
}

/// Well-known text fields with a dedicated frame in every generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Artist,
    Album,
    Title,
    Track,
    Year,
}

/// v2.3 frame IDs replaced wholesale when a tag is rewritten.
pub const REPLACED_IDS: &[&str] = &["TIT2", "TALB", "TPE1", "TRCK", "TYER"];

/// Parsed ID3v2 frame header.
#[derive(Debug, Clone)]
pub struct FrameHeader {
    /// Frame ID, remapped to the tag's own vocabulary where needed
    pub id: String,
    /// Byte size of the frame body
    pub body_size: u32,
    /// Offset of the frame body within the tag bytes
    pub body_offset: usize,
    /// Byte size of this frame's header
    pub header_size: usize,
    /// Raw flag bits (v2.3/v2.4; always zero for v2.2)
    pub flags: u16,
}

impl FrameHeader {
    /// Interprets `data` as a frame header of the given tag generation.
    ///
    /// `body_offset` is where the frame body starts within the tag bytes.
    /// Some old writers (iTunes 6.0 notably) emit v2.2 frame IDs inside
    /// newer tags; those are remapped to the tag's own vocabulary rather
    /// than rejected.
    pub fn parse(version: u8, data: &[u8], body_offset: usize) -> Result<FrameHeader, TagError> {
        let (id, body_size, header_size, flags) = match version {
            2 => {
                let id = frame_id_str(&data[..3], version)?;
                (id, read_u24(&data[3..6]), 6, 0u16)
            }
            3 => {
                let id = frame_id_str(&data[..4], version)?;
                let body_size = read_u32(&data[4..8]);
                let flags = read_u16(&data[8..10]);
                let unknown = flags & !0xE0E0;
                if unknown != 0 {
                    return Err(TagError::Malformed(format!(
                        "unknown ID3v2.3 frame flags 0x{:04X} on '{}'",
                        unknown, id
                    )));
                }
                (id, body_size, 10, flags)
            }
            _ => {
                let id = frame_id_str(&data[..4], version)?;
                let body_size = decode_syncsafe(&data[4..8])?;
                let flags = read_u16(&data[8..10]);
                let unknown = flags & !0x704F;
                if unknown != 0 {
                    return Err(TagError::Malformed(format!(
                        "unknown ID3v2.4 frame flags 0x{:04X} on '{}'",
                        unknown, id
                    )));
                }
                (id, body_size, 10, flags)
            }
        };

        let id = resolve_frame_id(version, id)?;
        if body_size == 0 {
            warn!(frame_id = %id, "empty frame, technically illegal");
        }

        Ok(FrameHeader {
            id,
            body_size,
            body_offset,
            header_size,
            flags,
        })
    }
}

fn frame_id_str(bytes: &[u8], version: u8) -> Result<String, TagError> {
    if !bytes.is_ascii() {
        return Err(TagError::Malformed(format!(
            "non-ASCII ID3v2.{} frame ID",
            version
        )));
    }
    Ok(bytes.iter().map(|&b| b as char).collect())
}

/// Validates a frame ID against the generation's vocabulary, remapping
/// stray v2.2 IDs found inside newer tags.
fn resolve_frame_id(version: u8, id: String) -> Result<String, TagError> {
    let experimental = id
        .chars()
        .next()
        .is_some_and(|c| EXPERIMENTAL_FRAME_ID_PREFIXES.contains(&c));
    if experimental || is_known_id(version, &id) {
        return Ok(id);
    }
    if version >= 3 && id.len() >= 3 {
        let prefix = &id[..3];
        if let Some(mapped) = upgrade_frame_id(prefix) {
            warn!(
                from = %id,
                to = %mapped,
                "remapped ID3v2.2 frame ID found inside an ID3v2.{} tag",
                version
            );
            return Ok(mapped.to_string());
        }
    }
    Err(TagError::UnknownFrameId { version, id })
}
