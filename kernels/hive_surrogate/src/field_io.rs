// Spatial field output: template rewrite + external renderer hand-off
//
// The spatial template is a legacy ASCII VTK file carrying the experiment
// mesh. We never design or edit the mesh itself: the template's geometry is
// copied through untouched and only its point scalar data is replaced with
// the reconstructed field. The rewritten file is then handed to an
// out-of-process renderer (fixed contract: -i input -o output -r field)
// which emits the renderable scene consumed by the page.

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::error::SurrogateError;

// ============================================================================
// TEMPLATE REWRITE
// ============================================================================

// Write reconstructed field values into the spatial template
//
// Reads `template`, replaces everything after its POINT_DATA declaration
// with a single scalar array named `field_name`, and writes the result to
// `output`. The template's point count must match the field length.
pub fn write_field(
    field_name: &str,
    values: &[f64],
    template: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<(), SurrogateError> {
    let template = template.as_ref();
    let output = output.as_ref();

    let raw = fs::read_to_string(template).map_err(|source| SurrogateError::Io {
        path: template.to_path_buf(),
        source,
    })?;

    // Locate the POINT_DATA declaration; geometry above it passes through
    let (head, num_points) = split_at_point_data(&raw)
        .ok_or_else(|| SurrogateError::load(template, "no POINT_DATA section in template"))?;

    if values.len() != num_points {
        return Err(SurrogateError::DimensionMismatch(format!(
            "reconstructed field has {} values but the template has {num_points} points",
            values.len()
        )));
    }

    // VTK array names cannot contain whitespace; the display label keeps
    // its spaces, the stored name swaps them out
    let array_name = field_name.replace(char::is_whitespace, "_");

    let mut out = String::with_capacity(head.len() + values.len() * 16);
    out.push_str(head);
    out.push_str(&format!("POINT_DATA {num_points}\n"));
    out.push_str(&format!("SCALARS {array_name} double 1\n"));
    out.push_str("LOOKUP_TABLE default\n");
    for value in values {
        out.push_str(&format!("{value}\n"));
    }

    fs::write(output, out).map_err(|source| SurrogateError::Io {
        path: output.to_path_buf(),
        source,
    })
}

// Split the template at its POINT_DATA line, returning the text above it
// and the declared point count
fn split_at_point_data(raw: &str) -> Option<(&str, usize)> {
    let mut offset = 0;
    for line in raw.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("POINT_DATA") {
            let count = rest.trim().parse::<usize>().ok()?;
            return Some((&raw[..offset], count));
        }
        offset += line.len() + 1; // +1 for the newline lines() consumed
    }
    None
}

// ============================================================================
// RENDERER SUBPROCESS
// ============================================================================

// Hand the written field file to the external scene renderer
//
// Blocking call; the renderer's stdout/stderr pass through. A renderer
// that cannot be spawned or exits non-zero is a fatal error for this
// render, matching the no-partial-result contract.
pub fn render_scene(
    renderer: impl AsRef<Path>,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    field_name: &str,
) -> Result<(), SurrogateError> {
    let renderer = renderer.as_ref();
    let status = Command::new(renderer)
        .arg("-i")
        .arg(input.as_ref())
        .arg("-o")
        .arg(output.as_ref())
        .arg("-r")
        .arg(field_name)
        .status()
        .map_err(|source| SurrogateError::Io {
            path: renderer.to_path_buf(),
            source,
        })?;

    if !status.success() {
        return Err(SurrogateError::Renderer {
            command: renderer.display().to_string(),
            status: status.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "\
# vtk DataFile Version 3.0
hive template
ASCII
DATASET UNSTRUCTURED_GRID
POINTS 3 double
0.0 0.0 0.0
1.0 0.0 0.0
0.0 1.0 0.0
POINT_DATA 3
SCALARS placeholder double 1
LOOKUP_TABLE default
0.0
0.0
0.0
";

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{name}_{}", std::process::id()))
    }

    #[test]
    fn test_write_field_replaces_scalars() {
        let template = temp_path("template.vtk");
        let output = temp_path("field_out.vtk");
        fs::write(&template, TEMPLATE).unwrap();

        write_field("Temperature [K]", &[300.0, 450.5, 320.0], &template, &output).unwrap();
        let written = fs::read_to_string(&output).unwrap();
        fs::remove_file(&template).ok();
        fs::remove_file(&output).ok();

        // Geometry preserved, placeholder scalars replaced
        assert!(written.contains("POINTS 3 double"));
        assert!(written.contains("SCALARS Temperature_[K] double 1"));
        assert!(written.contains("450.5"));
        assert!(!written.contains("placeholder"));
    }

    #[test]
    fn test_wrong_length_field_rejected() {
        let template = temp_path("template_len.vtk");
        fs::write(&template, TEMPLATE).unwrap();

        let result = write_field(
            "Temperature",
            &[300.0, 450.5],
            &template,
            temp_path("unused.vtk"),
        );
        fs::remove_file(&template).ok();

        assert!(matches!(
            result,
            Err(SurrogateError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_template_without_point_data_rejected() {
        let template = temp_path("template_bad.vtk");
        fs::write(&template, "# vtk DataFile Version 3.0\nno point data here\n").unwrap();

        let result = write_field("T", &[1.0], &template, temp_path("unused2.vtk"));
        fs::remove_file(&template).ok();

        assert!(matches!(result, Err(SurrogateError::Load { .. })));
    }

    #[test]
    fn test_missing_template_is_io_error() {
        let result = write_field("T", &[1.0], "/nonexistent/template.vtk", temp_path("x.vtk"));
        assert!(matches!(result, Err(SurrogateError::Io { .. })));
    }

    #[test]
    fn test_split_at_point_data() {
        let (head, n) = split_at_point_data(TEMPLATE).unwrap();
        assert_eq!(n, 3);
        assert!(head.ends_with("0.0 1.0 0.0\n"));
    }
}
