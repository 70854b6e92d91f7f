use crate::boxes::FourCC;

/// ISOBMFF boxes whose payload is nothing but child boxes.
///
/// FullBox-style parents (`meta`, `stsd`, `dref`, ...) are left out: their
/// children start after a version/flags prefix, so they cannot be walked as a
/// plain box sequence.
pub const ISOBMFF_CONTAINERS: &[FourCC] = &[
    FourCC(*b"moov"),
    FourCC(*b"trak"),
    FourCC(*b"edts"),
    FourCC(*b"mdia"),
    FourCC(*b"minf"),
    FourCC(*b"dinf"),
    FourCC(*b"stbl"),
    FourCC(*b"mvex"),
    FourCC(*b"moof"),
    FourCC(*b"traf"),
    FourCC(*b"mfra"),
    FourCC(*b"udta"),
    FourCC(*b"tref"),
    FourCC(*b"sinf"),
    FourCC(*b"schi"),
    FourCC(*b"meco"),
];

/// Typed view over the box types this crate knows by name.
///
/// Anything not in this list becomes `KnownBox::Unknown(fourcc)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownBox {
    // File-level
    Ftyp,
    Moov,
    Mdat,
    Free,
    Skip,
    Uuid,
    Meta,

    // Structure
    Trak,
    Edts,
    Mdia,
    Minf,
    Dinf,
    Stbl,
    Mvex,
    Moof,
    Traf,
    Mfra,
    Udta,
    Tref,
    Sinf,
    Schi,
    Meco,

    // JUMBF (ISO/IEC 19566-5)
    Jumb,
    Jumd,
    Json,

    Unknown(FourCC),
}

impl From<FourCC> for KnownBox {
    fn from(cc: FourCC) -> Self {
        match &cc.0 {
            b"ftyp" => KnownBox::Ftyp,
            b"moov" => KnownBox::Moov,
            b"mdat" => KnownBox::Mdat,
            b"free" => KnownBox::Free,
            b"skip" => KnownBox::Skip,
            b"uuid" => KnownBox::Uuid,
            b"meta" => KnownBox::Meta,
            b"trak" => KnownBox::Trak,
            b"edts" => KnownBox::Edts,
            b"mdia" => KnownBox::Mdia,
            b"minf" => KnownBox::Minf,
            b"dinf" => KnownBox::Dinf,
            b"stbl" => KnownBox::Stbl,
            b"mvex" => KnownBox::Mvex,
            b"moof" => KnownBox::Moof,
            b"traf" => KnownBox::Traf,
            b"mfra" => KnownBox::Mfra,
            b"udta" => KnownBox::Udta,
            b"tref" => KnownBox::Tref,
            b"sinf" => KnownBox::Sinf,
            b"schi" => KnownBox::Schi,
            b"meco" => KnownBox::Meco,
            b"jumb" => KnownBox::Jumb,
            b"jumd" => KnownBox::Jumd,
            b"json" => KnownBox::Json,
            _ => KnownBox::Unknown(cc),
        }
    }
}

impl KnownBox {
    pub fn full_name(&self) -> &'static str {
        match self {
            KnownBox::Ftyp => "File Type Box",
            KnownBox::Moov => "Movie Box",
            KnownBox::Mdat => "Media Data Box",
            KnownBox::Free => "Free Space Box",
            KnownBox::Skip => "Free Space Box",
            KnownBox::Uuid => "User Extension Box",
            KnownBox::Meta => "Meta Box",
            KnownBox::Trak => "Track Box",
            KnownBox::Edts => "Edit Box",
            KnownBox::Mdia => "Media Box",
            KnownBox::Minf => "Media Information Box",
            KnownBox::Dinf => "Data Information Box",
            KnownBox::Stbl => "Sample Table Box",
            KnownBox::Mvex => "Movie Extends Box",
            KnownBox::Moof => "Movie Fragment Box",
            KnownBox::Traf => "Track Fragment Box",
            KnownBox::Mfra => "Movie Fragment Random Access Box",
            KnownBox::Udta => "User Data Box",
            KnownBox::Tref => "Track Reference Box",
            KnownBox::Sinf => "Protection Scheme Information Box",
            KnownBox::Schi => "Scheme Information Box",
            KnownBox::Meco => "Additional Metadata Container Box",
            KnownBox::Jumb => "JUMBF Superbox",
            KnownBox::Jumd => "JUMBF Description Box",
            KnownBox::Json => "JSON Content Box",
            KnownBox::Unknown(_) => "Unknown Box",
        }
    }
}
