//! Stanford PLY reader: `ascii` and `binary_little_endian`.
//!
//! Reads the `vertex` element (x/y/z, optional nx/ny/nz, s/t or u/v,
//! red/green/blue) and the `face` element, fan-triangulating polygons.
//! Other elements are parsed and skipped.

use crate::AssetError;
use std::path::Path;
use vitrine_scene::MeshData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Ascii,
    BinaryLittleEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl Scalar {
    fn parse(name: &str) -> Result<Self, AssetError> {
        Ok(match name {
            "char" | "int8" => Self::I8,
            "uchar" | "uint8" => Self::U8,
            "short" | "int16" => Self::I16,
            "ushort" | "uint16" => Self::U16,
            "int" | "int32" => Self::I32,
            "uint" | "uint32" => Self::U32,
            "float" | "float32" => Self::F32,
            "double" | "float64" => Self::F64,
            other => return Err(ply_error(format!("unknown property type {other}"))),
        })
    }

    fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

#[derive(Debug, Clone)]
enum Property {
    Scalar { name: String, ty: Scalar },
    List { name: String, count: Scalar, item: Scalar },
}

impl Property {
    fn name(&self) -> &str {
        match self {
            Self::Scalar { name, .. } | Self::List { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

#[derive(Debug)]
struct Header {
    format: Format,
    elements: Vec<Element>,
    body_offset: usize,
}

fn ply_error(msg: impl Into<String>) -> AssetError {
    AssetError::Ply(msg.into())
}

fn parse_header(bytes: &[u8]) -> Result<Header, AssetError> {
    const END: &[u8] = b"end_header";
    let end = bytes
        .windows(END.len())
        .position(|w| w == END)
        .ok_or_else(|| ply_error("missing end_header"))?;
    let mut body_offset = end + END.len();
    // header line ends with \n or \r\n
    if bytes.get(body_offset) == Some(&b'\r') {
        body_offset += 1;
    }
    if bytes.get(body_offset) == Some(&b'\n') {
        body_offset += 1;
    }

    let text = std::str::from_utf8(&bytes[..end]).map_err(|e| ply_error(e.to_string()))?;
    let mut lines = text.lines().map(str::trim);
    if lines.next() != Some("ply") {
        return Err(ply_error("missing ply magic"));
    }

    let mut format = None;
    let mut elements: Vec<Element> = Vec::new();
    for line in lines {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["format", "ascii", _] => format = Some(Format::Ascii),
            ["format", "binary_little_endian", _] => format = Some(Format::BinaryLittleEndian),
            ["format", other, ..] => return Err(ply_error(format!("unsupported format {other}"))),
            ["element", name, count] => elements.push(Element {
                name: (*name).to_string(),
                count: count
                    .parse()
                    .map_err(|_| ply_error(format!("bad element count {count}")))?,
                properties: Vec::new(),
            }),
            ["property", "list", count, item, name] => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| ply_error("property before element"))?;
                element.properties.push(Property::List {
                    name: (*name).to_string(),
                    count: Scalar::parse(count)?,
                    item: Scalar::parse(item)?,
                });
            }
            ["property", ty, name] => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| ply_error("property before element"))?;
                element.properties.push(Property::Scalar {
                    name: (*name).to_string(),
                    ty: Scalar::parse(ty)?,
                });
            }
            _ => {}
        }
    }

    Ok(Header {
        format: format.ok_or_else(|| ply_error("missing format line"))?,
        elements,
        body_offset,
    })
}

/// Reads successive values from the body in either encoding.
enum Body<'a> {
    Ascii {
        tokens: std::str::SplitAsciiWhitespace<'a>,
        len: usize,
    },
    Binary { bytes: &'a [u8], pos: usize },
}

impl Body<'_> {
    /// Upper bound on how many `ty` values the body can still hold.
    fn max_items(&self, ty: Scalar) -> usize {
        match self {
            Body::Ascii { len, .. } => *len,
            Body::Binary { bytes, pos } => bytes.len().saturating_sub(*pos) / ty.size(),
        }
    }

    /// Read a list length and check it against what the body can hold.
    fn list_len(&mut self, count: Scalar, item: Scalar) -> Result<usize, AssetError> {
        let n = self.next(count)?;
        if !(n.is_finite() && n >= 0.0 && n.fract() == 0.0) {
            return Err(ply_error(format!("bad list length {n}")));
        }
        let max = self.max_items(item);
        if n > max as f64 {
            return Err(ply_error(format!("list length {n} exceeds remaining data")));
        }
        Ok(n as usize)
    }

    fn next(&mut self, ty: Scalar) -> Result<f64, AssetError> {
        match self {
            Body::Ascii { tokens, .. } => {
                let token = tokens
                    .next()
                    .ok_or_else(|| ply_error("unexpected end of data"))?;
                token
                    .parse::<f64>()
                    .map_err(|_| ply_error(format!("bad number {token}")))
            }
            Body::Binary { bytes, pos } => {
                let size = ty.size();
                let raw = bytes
                    .get(*pos..*pos + size)
                    .ok_or_else(|| ply_error("unexpected end of data"))?;
                *pos += size;
                let mut buf = [0u8; 8];
                buf[..size].copy_from_slice(raw);
                Ok(match ty {
                    Scalar::I8 => f64::from(raw[0] as i8),
                    Scalar::U8 => f64::from(raw[0]),
                    Scalar::I16 => f64::from(i16::from_le_bytes([buf[0], buf[1]])),
                    Scalar::U16 => f64::from(u16::from_le_bytes([buf[0], buf[1]])),
                    Scalar::I32 => f64::from(i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])),
                    Scalar::U32 => f64::from(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])),
                    Scalar::F32 => f64::from(f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])),
                    Scalar::F64 => f64::from_le_bytes(buf),
                })
            }
        }
    }
}

/// Parse a whole PLY file held in memory.
pub fn parse_ply(bytes: &[u8]) -> Result<MeshData, AssetError> {
    let header = parse_header(bytes)?;
    let rest = &bytes[header.body_offset..];
    let mut body = match header.format {
        Format::Ascii => Body::Ascii {
            tokens: std::str::from_utf8(rest)
                .map_err(|e| ply_error(e.to_string()))?
                .split_ascii_whitespace(),
            len: rest.len(),
        },
        Format::BinaryLittleEndian => Body::Binary { bytes: rest, pos: 0 },
    };

    let mut mesh = MeshData::default();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut colors = Vec::new();

    for element in &header.elements {
        let index_of = |names: &[&str]| {
            element
                .properties
                .iter()
                .position(|p| names.contains(&p.name()))
        };
        let xyz = [index_of(&["x"]), index_of(&["y"]), index_of(&["z"])];
        let nxyz = [index_of(&["nx"]), index_of(&["ny"]), index_of(&["nz"])];
        let st = [index_of(&["s", "u", "texture_u"]), index_of(&["t", "v", "texture_v"])];
        let rgb = [index_of(&["red"]), index_of(&["green"]), index_of(&["blue"])];

        for _ in 0..element.count {
            let mut scalars = vec![0.0f64; element.properties.len()];
            let mut list = Vec::new();
            for (i, property) in element.properties.iter().enumerate() {
                match property {
                    Property::Scalar { ty, .. } => scalars[i] = body.next(*ty)?,
                    Property::List { name, count, item } => {
                        let n = body.list_len(*count, *item)?;
                        let mut items = Vec::with_capacity(n);
                        for _ in 0..n {
                            items.push(body.next(*item)? as u32);
                        }
                        if name == "vertex_indices" || name == "vertex_index" {
                            list = items;
                        }
                    }
                }
            }

            match element.name.as_str() {
                "vertex" => {
                    let get = |slot: Option<usize>| slot.map(|i| scalars[i] as f32);
                    if let [Some(x), Some(y), Some(z)] = xyz.map(get) {
                        mesh.positions.push([x, y, z]);
                    }
                    if let [Some(x), Some(y), Some(z)] = nxyz.map(get) {
                        normals.push([x, y, z]);
                    }
                    if let [Some(s), Some(t)] = st.map(get) {
                        uvs.push([s, t]);
                    }
                    if let [Some(r), Some(g), Some(b)] = rgb.map(get) {
                        colors.push([r / 255.0, g / 255.0, b / 255.0]);
                    }
                }
                "face" => {
                    for k in 1..list.len().saturating_sub(1) {
                        mesh.indices.extend([list[0], list[k], list[k + 1]]);
                    }
                }
                _ => {}
            }
        }
    }

    let count = mesh.positions.len();
    if let Some(bad) = mesh.indices.iter().find(|&&i| i as usize >= count) {
        return Err(ply_error(format!("face index {bad} out of range")));
    }
    if normals.len() == count {
        mesh.normals = normals;
    }
    mesh.uvs = if uvs.len() == count {
        uvs
    } else {
        vec![[0.0, 0.0]; count]
    };
    if colors.len() == count && count > 0 {
        mesh.colors = Some(colors);
    }
    tracing::debug!(
        vertices = count,
        triangles = mesh.triangle_count(),
        "parsed PLY"
    );
    Ok(mesh)
}

pub fn read_ply(path: &Path) -> Result<MeshData, AssetError> {
    let bytes = std::fs::read(path)?;
    parse_ply(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "ply
format ascii 1.0
comment two triangles
element vertex 4
property float x
property float y
property float z
property uchar red
property uchar green
property uchar blue
element face 1
property list uchar int vertex_indices
end_header
0 0 0 255 0 0
1 0 0 255 0 0
1 1 0 255 0 0
0 1 0 255 0 0
4 0 1 2 3
";

    #[test]
    fn ascii_quad_is_fanned() {
        let mesh = parse_ply(QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.colors.as_ref().unwrap()[0], [1.0, 0.0, 0.0]);
        assert!(mesh.normals.is_empty());
    }

    #[test]
    fn binary_little_endian() {
        let mut bytes = b"ply\nformat binary_little_endian 1.0\nelement vertex 3\n\
property float x\nproperty float y\nproperty float z\n\
property float nx\nproperty float ny\nproperty float nz\n\
element face 1\nproperty list uchar uint vertex_indices\nend_header\n"
            .to_vec();
        for v in [[0.0f32, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]] {
            for c in v.into_iter().chain([0.0, 0.0, 1.0]) {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        bytes.push(3);
        for i in [0u32, 1, 2] {
            bytes.extend_from_slice(&i.to_le_bytes());
        }

        let mesh = parse_ply(&bytes).unwrap();
        assert_eq!(mesh.positions[1], [2.0, 0.0, 0.0]);
        assert_eq!(mesh.normals[2], [0.0, 0.0, 1.0]);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn skips_unknown_elements() {
        let src = "ply
format ascii 1.0
element vertex 3
property float x
property float y
property float z
element edge 1
property int vertex1
property int vertex2
element face 1
property list uchar int vertex_index
end_header
0 0 0
1 0 0
0 1 0
0 1
3 0 1 2
";
        let mesh = parse_ply(src.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_ply(b"not a ply").is_err());
        let big_endian = "ply\nformat binary_big_endian 1.0\nend_header\n";
        assert!(matches!(parse_ply(big_endian.as_bytes()), Err(AssetError::Ply(_))));
        let out_of_range = QUAD.replace("4 0 1 2 3", "3 0 1 9");
        assert!(parse_ply(out_of_range.as_bytes()).is_err());
    }

    #[test]
    fn oversized_list_lengths_are_errors() {
        let huge = QUAD.replace("4 0 1 2 3", "1e30 0 1 2");
        assert!(matches!(parse_ply(huge.as_bytes()), Err(AssetError::Ply(_))));
        let negative = QUAD.replace("4 0 1 2 3", "-3 0 1 2");
        assert!(parse_ply(negative.as_bytes()).is_err());
        let fractional = QUAD.replace("4 0 1 2 3", "2.5 0 1 2");
        assert!(parse_ply(fractional.as_bytes()).is_err());

        let mut bytes = b"ply\nformat binary_little_endian 1.0\nelement face 1\n\
property list uint uint vertex_indices\nend_header\n"
            .to_vec();
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        assert!(matches!(parse_ply(&bytes), Err(AssetError::Ply(_))));
    }

    #[test]
    fn truncated_body_is_an_error() {
        let truncated = QUAD.replace("4 0 1 2 3\n", "");
        assert!(parse_ply(truncated.as_bytes()).is_err());
    }
}
