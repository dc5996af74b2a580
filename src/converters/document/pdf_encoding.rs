//! Single-byte font encodings for PDF simple fonts.
//!
//! A simple font without a `ToUnicode` map names its code → glyph mapping
//! through `/Encoding`: a base encoding (WinAnsi or MacRoman) optionally
//! patched by a `/Differences` array of glyph names. Glyph names resolve
//! through a table covering the Latin repertoire of both base encodings,
//! plus the `uniXXXX` and `uXXXX` conventions.

use once_cell::sync::Lazy;

/// Code → character table for one simple font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleEncoding {
    table: [char; 256],
}

/// `WinAnsiEncoding`: Latin-1 with typographic punctuation in 0x80..0x9F.
pub static WIN_ANSI: Lazy<SimpleEncoding> =
    Lazy::new(|| SimpleEncoding::with_high(0x80, &WIN_ANSI_80));

/// `MacRomanEncoding`: ASCII below 0x80, Mac OS Roman above.
pub static MAC_ROMAN: Lazy<SimpleEncoding> =
    Lazy::new(|| SimpleEncoding::with_high(0x80, &MAC_ROMAN_80));

impl SimpleEncoding {
    /// Latin-1 identity with `high` overlaid from `start`. Zero entries in
    /// `high` leave the Latin-1 character in place.
    fn with_high(start: usize, high: &[u16]) -> Self {
        let mut table = ['\0'; 256];
        for (code, slot) in table.iter_mut().enumerate() {
            *slot = code as u8 as char;
        }
        for (offset, &unit) in high.iter().enumerate() {
            if let Some(c) = char::from_u32(unit as u32).filter(|_| unit != 0) {
                table[start + offset] = c;
            }
        }
        Self { table }
    }

    /// A base encoding by its PDF name. `StandardEncoding` and the
    /// expert sets are not tabled and yield `None`.
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"WinAnsiEncoding" => Some(WIN_ANSI.clone()),
            b"MacRomanEncoding" => Some(MAC_ROMAN.clone()),
            _ => None,
        }
    }

    /// Remap `code` to the glyph `name`. Unknown glyph names are ignored.
    pub fn set_glyph(&mut self, code: u8, name: &str) -> bool {
        match glyph_to_char(name) {
            Some(c) => {
                self.table[code as usize] = c;
                true
            }
            None => false,
        }
    }

    pub fn char(&self, code: u8) -> char {
        self.table[code as usize]
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        bytes.iter().map(|&b| self.char(b)).collect()
    }
}

/// Resolve an Adobe glyph name to its character.
///
/// Suffixes after a period (`a.sc`, `one.oldstyle`) are dropped first.
pub fn glyph_to_char(name: &str) -> Option<char> {
    let base = name.split('.').next().unwrap_or(name);
    let mut chars = base.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return Some(c);
        }
    }
    if let Some(&(_, c)) = GLYPH_NAMES.iter().find(|(n, _)| *n == base) {
        return Some(c);
    }
    if let Some(hex) = base.strip_prefix("uni").filter(|h| h.len() >= 4) {
        return u32::from_str_radix(&hex[..4], 16).ok().and_then(char::from_u32);
    }
    if let Some(hex) = base.strip_prefix('u').filter(|h| (4..=6).contains(&h.len())) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    None
}

// ── Tables ───────────────────────────────────────────────────────────────────

#[rustfmt::skip]
const WIN_ANSI_80: [u16; 32] = [
    0x20AC, 0,      0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021,
    0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, 0,      0x017D, 0,
    0,      0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014,
    0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0,      0x017E, 0x0178,
];

#[rustfmt::skip]
const MAC_ROMAN_80: [u16; 128] = [
    0x00C4, 0x00C5, 0x00C7, 0x00C9, 0x00D1, 0x00D6, 0x00DC, 0x00E1,
    0x00E0, 0x00E2, 0x00E4, 0x00E3, 0x00E5, 0x00E7, 0x00E9, 0x00E8,
    0x00EA, 0x00EB, 0x00ED, 0x00EC, 0x00EE, 0x00EF, 0x00F1, 0x00F3,
    0x00F2, 0x00F4, 0x00F6, 0x00F5, 0x00FA, 0x00F9, 0x00FB, 0x00FC,
    0x2020, 0x00B0, 0x00A2, 0x00A3, 0x00A7, 0x2022, 0x00B6, 0x00DF,
    0x00AE, 0x00A9, 0x2122, 0x00B4, 0x00A8, 0x2260, 0x00C6, 0x00D8,
    0x221E, 0x00B1, 0x2264, 0x2265, 0x00A5, 0x00B5, 0x2202, 0x2211,
    0x220F, 0x03C0, 0x222B, 0x00AA, 0x00BA, 0x03A9, 0x00E6, 0x00F8,
    0x00BF, 0x00A1, 0x00AC, 0x221A, 0x0192, 0x2248, 0x2206, 0x00AB,
    0x00BB, 0x2026, 0x00A0, 0x00C0, 0x00C3, 0x00D5, 0x0152, 0x0153,
    0x2013, 0x2014, 0x201C, 0x201D, 0x2018, 0x2019, 0x00F7, 0x25CA,
    0x00FF, 0x0178, 0x2044, 0x00A4, 0x2039, 0x203A, 0xFB01, 0xFB02,
    0x2021, 0x00B7, 0x201A, 0x201E, 0x2030, 0x00C2, 0x00CA, 0x00C1,
    0x00CB, 0x00C8, 0x00CD, 0x00CE, 0x00CF, 0x00CC, 0x00D3, 0x00D4,
    0xF8FF, 0x00D2, 0x00DA, 0x00DB, 0x00D9, 0x0131, 0x02C6, 0x02DC,
    0x00AF, 0x02D8, 0x02D9, 0x02DA, 0x00B8, 0x02DD, 0x02DB, 0x02C7,
];

/// Glyph names other than single letters.
#[rustfmt::skip]
static GLYPH_NAMES: &[(&str, char)] = &[
    // ASCII
    ("space", ' '), ("exclam", '!'), ("quotedbl", '"'), ("numbersign", '#'),
    ("dollar", '$'), ("percent", '%'), ("ampersand", '&'), ("quotesingle", '\''),
    ("parenleft", '('), ("parenright", ')'), ("asterisk", '*'), ("plus", '+'),
    ("comma", ','), ("hyphen", '-'), ("period", '.'), ("slash", '/'),
    ("zero", '0'), ("one", '1'), ("two", '2'), ("three", '3'), ("four", '4'),
    ("five", '5'), ("six", '6'), ("seven", '7'), ("eight", '8'), ("nine", '9'),
    ("colon", ':'), ("semicolon", ';'), ("less", '<'), ("equal", '='),
    ("greater", '>'), ("question", '?'), ("at", '@'), ("bracketleft", '['),
    ("backslash", '\\'), ("bracketright", ']'), ("asciicircum", '^'),
    ("underscore", '_'), ("grave", '`'), ("braceleft", '{'), ("bar", '|'),
    ("braceright", '}'), ("asciitilde", '~'),
    // Typographic punctuation and symbols
    ("quoteleft", '\u{2018}'), ("quoteright", '\u{2019}'),
    ("quotedblleft", '\u{201C}'), ("quotedblright", '\u{201D}'),
    ("quotesinglbase", '\u{201A}'), ("quotedblbase", '\u{201E}'),
    ("guilsinglleft", '\u{2039}'), ("guilsinglright", '\u{203A}'),
    ("guillemotleft", '\u{AB}'), ("guillemotright", '\u{BB}'),
    ("endash", '\u{2013}'), ("emdash", '\u{2014}'), ("bullet", '\u{2022}'),
    ("ellipsis", '\u{2026}'), ("dagger", '\u{2020}'), ("daggerdbl", '\u{2021}'),
    ("perthousand", '\u{2030}'), ("trademark", '\u{2122}'), ("Euro", '\u{20AC}'),
    ("florin", '\u{192}'), ("circumflex", '\u{2C6}'), ("tilde", '\u{2DC}'),
    ("fraction", '\u{2044}'), ("minus", '\u{2212}'), ("fi", '\u{FB01}'),
    ("fl", '\u{FB02}'), ("dotlessi", '\u{131}'), ("nbspace", '\u{A0}'),
    ("sfthyphen", '\u{AD}'), ("breve", '\u{2D8}'), ("dotaccent", '\u{2D9}'),
    ("ring", '\u{2DA}'), ("hungarumlaut", '\u{2DD}'), ("ogonek", '\u{2DB}'),
    ("caron", '\u{2C7}'), ("notequal", '\u{2260}'), ("infinity", '\u{221E}'),
    ("lessequal", '\u{2264}'), ("greaterequal", '\u{2265}'),
    ("partialdiff", '\u{2202}'), ("summation", '\u{2211}'), ("product", '\u{220F}'),
    ("pi", '\u{3C0}'), ("integral", '\u{222B}'), ("Omega", '\u{3A9}'),
    ("radical", '\u{221A}'), ("approxequal", '\u{2248}'), ("Delta", '\u{2206}'),
    ("lozenge", '\u{25CA}'),
    // Latin-1 supplement
    ("exclamdown", '¡'), ("cent", '¢'), ("sterling", '£'), ("currency", '¤'),
    ("yen", '¥'), ("brokenbar", '¦'), ("section", '§'), ("dieresis", '¨'),
    ("copyright", '©'), ("ordfeminine", 'ª'), ("logicalnot", '¬'),
    ("registered", '®'), ("macron", '¯'), ("degree", '°'), ("plusminus", '±'),
    ("twosuperior", '²'), ("threesuperior", '³'), ("acute", '´'), ("mu", 'µ'),
    ("paragraph", '¶'), ("periodcentered", '·'), ("cedilla", '¸'),
    ("onesuperior", '¹'), ("ordmasculine", 'º'), ("onequarter", '¼'),
    ("onehalf", '½'), ("threequarters", '¾'), ("questiondown", '¿'),
    ("Agrave", 'À'), ("Aacute", 'Á'), ("Acircumflex", 'Â'), ("Atilde", 'Ã'),
    ("Adieresis", 'Ä'), ("Aring", 'Å'), ("AE", 'Æ'), ("Ccedilla", 'Ç'),
    ("Egrave", 'È'), ("Eacute", 'É'), ("Ecircumflex", 'Ê'), ("Edieresis", 'Ë'),
    ("Igrave", 'Ì'), ("Iacute", 'Í'), ("Icircumflex", 'Î'), ("Idieresis", 'Ï'),
    ("Eth", 'Ð'), ("Ntilde", 'Ñ'), ("Ograve", 'Ò'), ("Oacute", 'Ó'),
    ("Ocircumflex", 'Ô'), ("Otilde", 'Õ'), ("Odieresis", 'Ö'), ("multiply", '×'),
    ("Oslash", 'Ø'), ("Ugrave", 'Ù'), ("Uacute", 'Ú'), ("Ucircumflex", 'Û'),
    ("Udieresis", 'Ü'), ("Yacute", 'Ý'), ("Thorn", 'Þ'), ("germandbls", 'ß'),
    ("agrave", 'à'), ("aacute", 'á'), ("acircumflex", 'â'), ("atilde", 'ã'),
    ("adieresis", 'ä'), ("aring", 'å'), ("ae", 'æ'), ("ccedilla", 'ç'),
    ("egrave", 'è'), ("eacute", 'é'), ("ecircumflex", 'ê'), ("edieresis", 'ë'),
    ("igrave", 'ì'), ("iacute", 'í'), ("icircumflex", 'î'), ("idieresis", 'ï'),
    ("eth", 'ð'), ("ntilde", 'ñ'), ("ograve", 'ò'), ("oacute", 'ó'),
    ("ocircumflex", 'ô'), ("otilde", 'õ'), ("odieresis", 'ö'), ("divide", '÷'),
    ("oslash", 'ø'), ("ugrave", 'ù'), ("uacute", 'ú'), ("ucircumflex", 'û'),
    ("udieresis", 'ü'), ("yacute", 'ý'), ("thorn", 'þ'), ("ydieresis", 'ÿ'),
    // Latin Extended in WinAnsi
    ("Scaron", 'Š'), ("scaron", 'š'), ("Zcaron", 'Ž'), ("zcaron", 'ž'),
    ("OE", 'Œ'), ("oe", 'œ'), ("Ydieresis", 'Ÿ'),
];
