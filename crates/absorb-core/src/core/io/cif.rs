use super::traits::StructureFile;
use crate::core::models::elements::atomic_mass;
use crate::core::models::structure::{Atom, AtomicStructure};
use nalgebra::{Matrix3, Point3, Vector3};
use std::io::{self, BufRead, Write};
use thiserror::Error;

const SYMMETRY_DUPLICATE_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct CifMetadata {
    /// Name following `data_` in the first data block.
    pub data_block: String,
}

impl Default for CifMetadata {
    fn default() -> Self {
        Self {
            data_block: "absorb".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CifError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("File contains no CIF data")]
    MissingDataBlock,
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),
    #[error("Invalid numeric value for {tag}: '{value}'")]
    InvalidNumber { tag: String, value: String },
    #[error("Malformed loop starting on line {line}: {reason}")]
    MalformedLoop { line: usize, reason: String },
    #[error("Tag {tag} on line {line} has no value")]
    MissingValue { tag: String, line: usize },
    #[error("Invalid symmetry operation '{0}'")]
    InvalidSymmetryOperation(String),
    #[error("Cell parameters do not describe a valid cell")]
    InvalidCell,
}

#[derive(Debug, Clone)]
struct Token {
    text: String,
    line: usize,
    quoted: bool,
}

impl Token {
    fn is_tag(&self) -> bool {
        !self.quoted && self.text.starts_with('_')
    }

    fn is_reserved(&self) -> bool {
        if self.quoted {
            return false;
        }
        let lower = self.text.to_ascii_lowercase();
        lower == "loop_"
            || lower.starts_with("data_")
            || lower.starts_with("save_")
            || lower == "global_"
            || lower == "stop_"
    }
}

fn tokenize(reader: &mut impl BufRead) -> Result<Vec<Token>, CifError> {
    let mut tokens = Vec::new();
    let mut text_field: Option<(usize, String)> = None;

    for (index, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line_num = index + 1;

        if let Some((start, mut content)) = text_field.take() {
            if line.starts_with(';') {
                tokens.push(Token {
                    text: content.trim().to_string(),
                    line: start,
                    quoted: true,
                });
            } else {
                content.push_str(&line);
                content.push('\n');
                text_field = Some((start, content));
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix(';') {
            text_field = Some((line_num, format!("{rest}\n")));
            continue;
        }

        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                i += 1;
                continue;
            }
            if c == '#' {
                break;
            }
            if c == '\'' || c == '"' {
                // A quote closes only when followed by whitespace or end of line.
                let mut j = i + 1;
                while j < chars.len()
                    && !(chars[j] == c && (j + 1 == chars.len() || chars[j + 1].is_whitespace()))
                {
                    j += 1;
                }
                tokens.push(Token {
                    text: chars[i + 1..j.min(chars.len())].iter().collect(),
                    line: line_num,
                    quoted: true,
                });
                i = j + 1;
                continue;
            }
            let start = i;
            while i < chars.len() && !chars[i].is_whitespace() {
                i += 1;
            }
            tokens.push(Token {
                text: chars[start..i].iter().collect(),
                line: line_num,
                quoted: false,
            });
        }
    }
    Ok(tokens)
}

#[derive(Debug, Default)]
struct CifLoop {
    tags: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CifLoop {
    fn column(&self, tag: &str) -> Option<usize> {
        self.tags.iter().position(|t| t == tag)
    }
}

#[derive(Debug, Default)]
struct DataBlock {
    name: Option<String>,
    items: Vec<(String, String)>,
    loops: Vec<CifLoop>,
}

impl DataBlock {
    fn item(&self, tag: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_str())
    }

    fn find_loop(&self, tag: &str) -> Option<&CifLoop> {
        self.loops.iter().find(|l| l.column(tag).is_some())
    }
}

/// Parses the first data block. Tags are lowercased.
fn parse_first_block(tokens: &[Token]) -> Result<DataBlock, CifError> {
    let mut block = DataBlock::default();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        let lower = token.text.to_ascii_lowercase();

        if !token.quoted && lower.starts_with("data_") {
            if block.name.is_some() {
                break;
            }
            block.name = Some(token.text["data_".len()..].to_string());
            i += 1;
        } else if !token.quoted && lower == "loop_" {
            let start_line = token.line;
            i += 1;
            let mut cif_loop = CifLoop::default();
            while i < tokens.len() && tokens[i].is_tag() {
                cif_loop.tags.push(tokens[i].text.to_ascii_lowercase());
                i += 1;
            }
            let mut values = Vec::new();
            while i < tokens.len() && !tokens[i].is_tag() && !tokens[i].is_reserved() {
                values.push(tokens[i].text.clone());
                i += 1;
            }
            if cif_loop.tags.is_empty() {
                return Err(CifError::MalformedLoop {
                    line: start_line,
                    reason: "loop has no tags".into(),
                });
            }
            if values.len() % cif_loop.tags.len() != 0 {
                return Err(CifError::MalformedLoop {
                    line: start_line,
                    reason: format!(
                        "{} values do not fill {} columns",
                        values.len(),
                        cif_loop.tags.len()
                    ),
                });
            }
            cif_loop.rows = values
                .chunks(cif_loop.tags.len())
                .map(<[String]>::to_vec)
                .collect();
            block.loops.push(cif_loop);
        } else if token.is_tag() {
            let value = tokens
                .get(i + 1)
                .filter(|t| !t.is_tag() && !t.is_reserved())
                .ok_or_else(|| CifError::MissingValue {
                    tag: token.text.clone(),
                    line: token.line,
                })?;
            block.items.push((lower, value.text.clone()));
            i += 2;
        } else {
            i += 1;
        }
    }

    if block.name.is_none() && block.items.is_empty() && block.loops.is_empty() {
        return Err(CifError::MissingDataBlock);
    }
    Ok(block)
}

/// Parses a CIF number, accepting a trailing standard uncertainty such as `1.234(5)`.
fn parse_number(tag: &str, value: &str) -> Result<f64, CifError> {
    let trimmed = value.split('(').next().unwrap_or(value).trim();
    trimmed.parse::<f64>().map_err(|_| CifError::InvalidNumber {
        tag: tag.to_string(),
        value: value.to_string(),
    })
}

fn required_number(block: &DataBlock, tag: &'static str) -> Result<f64, CifError> {
    let value = block.item(tag).ok_or(CifError::MissingTag(tag))?;
    parse_number(tag, value)
}

fn optional_angle(block: &DataBlock, tag: &'static str) -> Result<f64, CifError> {
    match block.item(tag) {
        Some(value) => parse_number(tag, value),
        None => Ok(90.0),
    }
}

/// Builds lattice vectors (as columns) in the standard orientation: `a` along x, `b` in the
/// xy-plane.
pub fn cell_from_parameters(
    lengths: [f64; 3],
    angles_degrees: [f64; 3],
) -> Result<Matrix3<f64>, CifError> {
    let [a, b, c] = lengths;
    let [alpha, beta, gamma] = angles_degrees.map(f64::to_radians);
    if lengths.iter().any(|&l| !(l.is_finite() && l > 0.0)) {
        return Err(CifError::InvalidCell);
    }

    let (cos_a, cos_b, cos_g) = (alpha.cos(), beta.cos(), gamma.cos());
    let sin_g = gamma.sin();
    if sin_g.abs() < 1e-10 {
        return Err(CifError::InvalidCell);
    }
    let cy = (cos_a - cos_b * cos_g) / sin_g;
    let cz_sq = 1.0 - cos_b * cos_b - cy * cy;
    if cz_sq <= 0.0 {
        return Err(CifError::InvalidCell);
    }

    Ok(Matrix3::from_columns(&[
        Vector3::new(a, 0.0, 0.0),
        Vector3::new(b * cos_g, b * sin_g, 0.0),
        Vector3::new(c * cos_b, c * cy, c * cz_sq.sqrt()),
    ]))
}

/// Lattice lengths and angles (degrees) of a cell stored as columns.
pub fn cell_parameters(cell: &Matrix3<f64>) -> ([f64; 3], [f64; 3]) {
    let a = cell.column(0).into_owned();
    let b = cell.column(1).into_owned();
    let c = cell.column(2).into_owned();
    let angle = |u: &Vector3<f64>, v: &Vector3<f64>| u.angle(v).to_degrees();
    (
        [a.norm(), b.norm(), c.norm()],
        [angle(&b, &c), angle(&a, &c), angle(&a, &b)],
    )
}

/// Extracts an element symbol from a type symbol or site label (`Pt1` -> `Pt`, `O2-` -> `O`).
fn species_from_label(raw: &str) -> String {
    let letters: String = raw.chars().take_while(char::is_ascii_alphabetic).collect();
    let mut chars = letters.chars();
    let normalized = match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
        None => return raw.to_string(),
    };
    if normalized.len() > 1 && atomic_mass(&normalized).is_none() {
        let single = normalized[..1].to_string();
        if atomic_mass(&single).is_some() {
            return single;
        }
    }
    normalized
}

#[derive(Debug, Clone, PartialEq)]
struct SymmetryOperation {
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
}

impl SymmetryOperation {
    fn parse(op: &str) -> Result<Self, CifError> {
        let invalid = || CifError::InvalidSymmetryOperation(op.to_string());
        let parts: Vec<&str> = op.split(',').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }

        let mut rotation = Matrix3::zeros();
        let mut translation = Vector3::zeros();
        for (row, expr) in parts.iter().enumerate() {
            let expr: String = expr
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            if expr.is_empty() {
                return Err(invalid());
            }

            let mut terms = Vec::new();
            let mut current = String::new();
            for c in expr.chars() {
                if (c == '+' || c == '-') && !current.is_empty() {
                    terms.push(std::mem::take(&mut current));
                }
                current.push(c);
            }
            terms.push(current);

            for term in terms {
                let (sign, body) = match term.strip_prefix('-') {
                    Some(rest) => (-1.0, rest),
                    None => (1.0, term.trim_start_matches('+')),
                };
                let variable = body.chars().last().and_then(|c| match c {
                    'x' => Some(0),
                    'y' => Some(1),
                    'z' => Some(2),
                    _ => None,
                });
                match variable {
                    Some(column) => {
                        let coefficient = &body[..body.len() - 1];
                        let coefficient = coefficient.trim_end_matches('*');
                        let factor = if coefficient.is_empty() {
                            1.0
                        } else {
                            parse_fraction(coefficient).ok_or_else(invalid)?
                        };
                        rotation[(row, column)] += sign * factor;
                    }
                    None => {
                        translation[row] += sign * parse_fraction(body).ok_or_else(invalid)?;
                    }
                }
            }
        }
        Ok(Self {
            rotation,
            translation,
        })
    }

    fn is_identity(&self) -> bool {
        self.rotation == Matrix3::identity() && self.translation.iter().all(|t| t.fract() == 0.0)
    }

    fn apply(&self, fractional: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * fractional + self.translation
    }
}

fn parse_fraction(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((num, den)) => {
            let den: f64 = den.parse().ok()?;
            (den != 0.0).then_some(num.parse::<f64>().ok()? / den)
        }
        None => s.parse().ok(),
    }
}

fn wrap_unit(v: &Vector3<f64>) -> Vector3<f64> {
    v.map(|x| {
        let wrapped = x - x.floor();
        if wrapped >= 1.0 - 1e-12 { 0.0 } else { wrapped }
    })
}

fn symmetry_operations(block: &DataBlock) -> Result<Vec<SymmetryOperation>, CifError> {
    const OP_TAGS: [&str; 2] = [
        "_symmetry_equiv_pos_as_xyz",
        "_space_group_symop_operation_xyz",
    ];
    for tag in OP_TAGS {
        if let Some(cif_loop) = block.find_loop(tag) {
            let column = cif_loop.column(tag).unwrap_or_default();
            return cif_loop
                .rows
                .iter()
                .map(|row| SymmetryOperation::parse(&row[column]))
                .collect();
        }
    }
    Ok(Vec::new())
}

/// Expands the asymmetric unit with every non-identity operation, dropping images that land
/// on an existing site of the same species.
fn expand_symmetry(
    sites: Vec<(String, Vector3<f64>)>,
    operations: &[SymmetryOperation],
) -> Vec<(String, Vector3<f64>)> {
    if operations.iter().all(SymmetryOperation::is_identity) {
        return sites;
    }

    let mut expanded: Vec<(String, Vector3<f64>)> = Vec::new();
    for (species, fractional) in &sites {
        for op in operations {
            let image = wrap_unit(&op.apply(fractional));
            let duplicate = expanded.iter().any(|(s, existing)| {
                s == species
                    && (existing - image)
                        .map(|d| d - d.round())
                        .norm()
                        < SYMMETRY_DUPLICATE_TOLERANCE
            });
            if !duplicate {
                expanded.push((species.clone(), image));
            }
        }
    }
    expanded
}

pub struct CifFile;

impl StructureFile for CifFile {
    type Metadata = CifMetadata;
    type Error = CifError;

    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(AtomicStructure, Self::Metadata), Self::Error> {
        let tokens = tokenize(reader)?;
        let block = parse_first_block(&tokens)?;

        let lengths = [
            required_number(&block, "_cell_length_a")?,
            required_number(&block, "_cell_length_b")?,
            required_number(&block, "_cell_length_c")?,
        ];
        let angles = [
            optional_angle(&block, "_cell_angle_alpha")?,
            optional_angle(&block, "_cell_angle_beta")?,
            optional_angle(&block, "_cell_angle_gamma")?,
        ];
        let cell = cell_from_parameters(lengths, angles)?;
        let inverse = cell.try_inverse().ok_or(CifError::InvalidCell)?;

        let fractional_tags = [
            "_atom_site_fract_x",
            "_atom_site_fract_y",
            "_atom_site_fract_z",
        ];
        let cartesian_tags = [
            "_atom_site_cartn_x",
            "_atom_site_cartn_y",
            "_atom_site_cartn_z",
        ];
        let (atom_loop, coordinate_tags, fractional) =
            if let Some(l) = block.find_loop(fractional_tags[0]) {
                (l, fractional_tags, true)
            } else if let Some(l) = block.find_loop(cartesian_tags[0]) {
                (l, cartesian_tags, false)
            } else {
                return Err(CifError::MissingTag("_atom_site_fract_x"));
            };

        let mut coordinate_columns = [0usize; 3];
        for (slot, tag) in coordinate_columns.iter_mut().zip(coordinate_tags) {
            *slot = atom_loop.column(tag).ok_or(CifError::MissingTag(tag))?;
        }
        let species_column = atom_loop
            .column("_atom_site_type_symbol")
            .or_else(|| atom_loop.column("_atom_site_label"))
            .ok_or(CifError::MissingTag("_atom_site_type_symbol"))?;

        let mut sites = Vec::with_capacity(atom_loop.rows.len());
        for row in &atom_loop.rows {
            let mut coords = Vector3::zeros();
            for (axis, &column) in coordinate_columns.iter().enumerate() {
                coords[axis] = parse_number(coordinate_tags[axis], &row[column])?;
            }
            let fractional_coords = if fractional { coords } else { inverse * coords };
            sites.push((species_from_label(&row[species_column]), fractional_coords));
        }

        let operations = symmetry_operations(&block)?;
        let atoms = expand_symmetry(sites, &operations)
            .into_iter()
            .map(|(species, frac)| Atom::new(&species, Point3::from(cell * frac)))
            .collect();

        let metadata = CifMetadata {
            data_block: block.name.unwrap_or_default(),
        };
        Ok((AtomicStructure::new(atoms, cell, [true; 3]), metadata))
    }

    fn write_to(
        structure: &AtomicStructure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let inverse = structure.cell().try_inverse().ok_or(CifError::InvalidCell)?;
        let ([a, b, c], [alpha, beta, gamma]) = cell_parameters(structure.cell());

        writeln!(writer, "data_{}", metadata.data_block)?;
        writeln!(writer, "_symmetry_space_group_name_H-M    'P 1'")?;
        writeln!(writer, "_symmetry_Int_Tables_number       1")?;
        writeln!(writer)?;
        writeln!(writer, "_cell_length_a       {a:.8}")?;
        writeln!(writer, "_cell_length_b       {b:.8}")?;
        writeln!(writer, "_cell_length_c       {c:.8}")?;
        writeln!(writer, "_cell_angle_alpha    {alpha:.8}")?;
        writeln!(writer, "_cell_angle_beta     {beta:.8}")?;
        writeln!(writer, "_cell_angle_gamma    {gamma:.8}")?;
        writeln!(writer)?;
        writeln!(writer, "loop_")?;
        writeln!(writer, "  _symmetry_equiv_pos_as_xyz")?;
        writeln!(writer, "  'x, y, z'")?;
        writeln!(writer)?;
        writeln!(writer, "loop_")?;
        writeln!(writer, "  _atom_site_label")?;
        writeln!(writer, "  _atom_site_type_symbol")?;
        writeln!(writer, "  _atom_site_fract_x")?;
        writeln!(writer, "  _atom_site_fract_y")?;
        writeln!(writer, "  _atom_site_fract_z")?;
        writeln!(writer, "  _atom_site_occupancy")?;
        for (i, atom) in structure.atoms().iter().enumerate() {
            let f = inverse * atom.position.coords;
            writeln!(
                writer,
                "  {}{} {} {:.8} {:.8} {:.8} 1.0",
                atom.species,
                i + 1,
                atom.species,
                f.x,
                f.y,
                f.z
            )?;
        }
        Ok(())
    }
}
