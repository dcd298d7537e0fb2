#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Bzip2,
}

impl Compression {
    /// Dual extensions recognized as compressed tarballs.
    pub const EXTENSIONS: [(&'static str, Compression); 4] = [
        (".tar.gz", Compression::Gzip),
        (".tgz", Compression::Gzip),
        (".tar.bz2", Compression::Bzip2),
        (".tbz2", Compression::Bzip2),
    ];

    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        Self::EXTENSIONS
            .iter()
            .find(|(ext, _)| lower.ends_with(ext))
            .map(|(_, kind)| *kind)
    }

    /// Leading bytes every stream of this kind starts with.
    pub fn magic(&self) -> &'static [u8] {
        match self {
            Compression::Gzip => &[0x1f, 0x8b],
            Compression::Bzip2 => b"BZh",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    FileName,
    InstanceNumber,
    ImagePositionPatient,
    TablePosition,
    None,
}

/// Value written into grid cells no frame occupies.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Fill {
    #[default]
    Mean,
    Value(f32),
}
