//! Column letters, absolute range strings and defined-name rules.
//!
//! Everything here works on 0-based indices, the way the workbook draft and
//! rust_xlsxwriter address cells. Rendered references are 1-based.

/// Last row index (0-based) of an xlsx worksheet.
pub const MAX_ROW: u32 = 1_048_575;

/// Convert a 0-based column index to letters (0 = A, 25 = Z, 26 = AA, ...).
pub fn col_to_letter(col: usize) -> String {
    let mut s = String::new();
    let mut n = col;
    loop {
        s.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    s
}

/// Convert column letters to a 0-based index (A = 0, AA = 26, ...).
pub fn col_from_letters(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut col = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(col - 1)
}

/// Parse a reference like `A1` or `$B$7` into 0-based `(row, col)`.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, usize)> {
    let cleaned = cell_ref.trim().replace('$', "");
    let split = cleaned.find(|c: char| c.is_ascii_digit())?;
    if split == 0 {
        return None;
    }
    let col = col_from_letters(&cleaned[..split])?;
    let row: u32 = cleaned[split..].parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col))
}

/// Quote a sheet name for use in a formula when it needs it.
pub fn quote_sheet(sheet: &str) -> String {
    if sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    }
}

/// Absolute single-column range, e.g. `Sets!$B$2:$B$9`.
pub fn column_range(sheet: &str, col: usize, first_row: u32, last_row: u32) -> String {
    let letter = col_to_letter(col);
    format!(
        "{}!${letter}${}:${letter}${}",
        quote_sheet(sheet),
        first_row + 1,
        last_row + 1
    )
}

/// A parsed single-column or rectangular range reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRef {
    pub sheet: Option<String>,
    pub first_row: u32,
    pub first_col: usize,
    pub last_row: u32,
    pub last_col: usize,
}

/// Parse `Sheet!$A$2:$A$9`, `'My Sheet'!A2:A9` or `A2:A9`.
pub fn parse_range_ref(reference: &str) -> Option<RangeRef> {
    let reference = reference.trim().trim_start_matches('=');
    let (sheet, cells) = match reference.rsplit_once('!') {
        Some((sheet, cells)) => {
            let sheet = sheet
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
                .map(|s| s.replace("''", "'"))
                .unwrap_or_else(|| sheet.to_string());
            (Some(sheet), cells)
        }
        None => (None, reference),
    };
    let (start, end) = cells.split_once(':').unwrap_or((cells, cells));
    let (first_row, first_col) = parse_cell_ref(start)?;
    let (last_row, last_col) = parse_cell_ref(end)?;
    Some(RangeRef {
        sheet,
        first_row,
        first_col,
        last_row,
        last_col,
    })
}

/// Replace the characters a cascading dropdown formula can normalize
/// (space and hyphen) with underscores.
pub fn name_fragment(value: &str) -> String {
    value.trim().replace([' ', '-'], "_")
}

/// Check a workbook-level defined name.
///
/// - Must start with a letter or underscore
/// - Can contain letters, numbers, underscores and dots
/// - Cannot look like a cell reference (A1, BC23) or a boolean literal
pub fn is_valid_name(name: &str) -> Result<(), String> {
    let Some(first) = name.chars().next() else {
        return Err("Name cannot be empty".into());
    };

    if !first.is_alphabetic() && first != '_' {
        return Err(format!("'{name}' must start with a letter or underscore"));
    }

    if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
        return Err(format!(
            "'{name}' can only contain letters, numbers, underscores, and dots"
        ));
    }

    if name.chars().count() > 255 {
        return Err(format!("'{name}' is longer than 255 characters"));
    }

    let upper = name.to_uppercase();
    if upper == "TRUE" || upper == "FALSE" {
        return Err(format!("'{name}' is a reserved boolean value"));
    }

    if looks_like_cell_ref(name) {
        return Err(format!("'{name}' looks like a cell reference"));
    }

    Ok(())
}

/// Check if a string looks like a cell reference (e.g., A1, AB123, XFD1048576)
fn looks_like_cell_ref(s: &str) -> bool {
    let split = s.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(s.len());
    let (letters, digits) = s.split_at(split);
    if letters.is_empty() || letters.len() > 3 {
        return false;
    }
    if !digits.is_empty() && !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    // Columns go up to XFD = 16384
    let col_num = letters
        .to_uppercase()
        .chars()
        .fold(0u32, |acc, c| acc * 26 + (c as u32 - 'A' as u32 + 1));
    if col_num > 16384 || digits.is_empty() {
        return false;
    }
    matches!(digits.parse::<u32>(), Ok(row) if (1..=1_048_576).contains(&row))
}
