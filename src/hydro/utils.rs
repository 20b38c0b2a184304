use std::{fs::File, io::Read, path::Path};

use boxarray::boxarray;

use crate::error::{FreezeOutError, Result};

fn parse_rows(contents: &str) -> Result<Vec<Vec<f64>>> {
    contents
        .split("\n")
        .enumerate()
        .filter(|(_, l)| !l.trim_start().starts_with("#") && l.trim().len() > 0)
        .map(|(i, l)| {
            l.split_whitespace()
                .map(|v| {
                    v.parse::<f64>().map_err(|e| FreezeOutError::Parse {
                        line: i + 1,
                        reason: format!("cannot parse \"{}\": {}", v, e),
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

/// Whitespace separated columns, `#` starts a comment line.
pub fn load_table(filename: &Path) -> Result<Vec<Vec<f64>>> {
    let mut file = File::open(filename)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    parse_rows(&contents)
}

pub fn load_matrix_2d<const VX: usize, const VY: usize>(
    filename: &Path,
) -> Result<Box<[[f64; VX]; VY]>> {
    let arr = load_table(filename)?;
    let vy = arr.len();
    let vx = arr.first().map(|r| r.len()).unwrap_or(0);
    if vy != VY || arr.iter().any(|r| r.len() != VX) {
        return Err(FreezeOutError::InvalidConfig(format!(
            "wrong matrix size in \"{}\": expected {}x{}, found {}x{}",
            filename.display(),
            VX,
            VY,
            vx,
            vy
        )));
    }
    let mut mat: Box<[[f64; VX]; VY]> = boxarray(0.0f64);
    for j in 0..VY {
        for i in 0..VX {
            mat[j][i] = arr[j][i];
        }
    }

    Ok(mat)
}
