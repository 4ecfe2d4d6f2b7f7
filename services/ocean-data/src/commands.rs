//! Subcommand handlers.
//!
//! Each handler returns its result as JSON; `main` prints it either as JSON
//! or as indented text.

use std::path::Path;

use anyhow::{anyhow, bail, Result};
use data_access::{load_sources, zone_display_name, Catalog, ZoneMasks};
use ocean_common::{units, Dataset, Payload, Placement, Table};
use ocean_metrics::{Metric, Reduction};
use serde_json::{json, Map, Value};
use tracing::info;

/// List every catalogued source.
pub fn sources(catalog: &Catalog) -> Result<Value> {
    let entries: Vec<Value> = catalog
        .names()
        .into_iter()
        .map(|name| match catalog.descriptor(name) {
            Ok(desc) => json!({
                "name": desc.name,
                "file_type": desc.file_type,
                "file_path": desc.file_path.display().to_string(),
                "data_type": desc.data_type.as_str(),
                "cleaning": desc.cleaning,
                "model": desc.model,
                "processing_level": desc.processing_level.to_string(),
            }),
            Err(e) => json!({ "name": name, "error": e.to_string() }),
        })
        .collect();
    Ok(json!({ "sources": entries }))
}

/// Load a source and summarise it.
pub fn show(catalog: &Catalog, name: &str, pattern: &str) -> Result<Value> {
    let mut source = catalog.source(name)?;
    let payload = source.get_data(pattern)?;
    let mut summary = match payload {
        Payload::Grid(ds) => summarise_dataset(ds),
        Payload::Table(table) => summarise_table(table),
    };
    if let Value::Object(map) = &mut summary {
        map.insert("source".to_string(), json!(name));
    }
    Ok(summary)
}

/// Load a gridded source and write it to a NetCDF file.
pub fn export(catalog: &Catalog, name: &str, output: &Path, pattern: &str) -> Result<Value> {
    let mut source = catalog.source(name)?;
    source.get_data(pattern)?;
    let dataset = source.dataset()?;

    netcdf_parser::write_dataset(output, dataset)?;
    info!(source = %name, output = %output.display(), "Exported data source");
    Ok(json!({
        "source": name,
        "output": output.display().to_string(),
        "variables": dataset.len(),
    }))
}

/// Arguments of [`compare`].
#[derive(Debug)]
pub struct CompareRequest<'a> {
    pub name: &'a str,
    pub reference: &'a str,
    pub variable: &'a str,
    pub metric: &'a str,
    pub dims: &'a [String],
    pub pattern: &'a str,
}

/// Compute a metric between one variable of two sources.
pub fn compare(catalog: &Catalog, request: &CompareRequest<'_>) -> Result<Value> {
    let metric = Metric::from_tag(request.metric)?;
    let mut sources = catalog.create_sources(&[request.name, request.reference])?;
    load_sources(&mut sources, request.pattern)?;

    let data = sources[0].dataset()?.variable(request.variable)?;
    let reference = sources[1].dataset()?.variable(request.variable)?;
    if data.dims != reference.dims {
        bail!(
            "'{}' lies on {:?} in {} but on {:?} in {}",
            request.variable,
            data.dims,
            request.name,
            reference.dims,
            request.reference
        );
    }

    let reduction = reduction_for(&data.dims, request.dims)?;
    let reduced = reduction.axes(data.ndim())?;
    let result = metric.compute(&data.data, &reference.data, None, &reduction)?;
    let kept: Vec<&String> = data
        .dims
        .iter()
        .enumerate()
        .filter(|(axis, _)| !reduced.contains(axis))
        .map(|(_, dim)| dim)
        .collect();

    info!(
        metric = %metric,
        variable = %request.variable,
        source = %request.name,
        reference = %request.reference,
        "Computed comparison metric"
    );
    Ok(json!({
        "metric": metric.as_str(),
        "variable": request.variable,
        "source": request.name,
        "reference": request.reference,
        "dims": kept,
        "shape": result.shape(),
        "values": result.iter().copied().collect::<Vec<f64>>(),
    }))
}

/// Compute and cache the mask of `zone` on the grid of a source.
pub fn mask(
    catalog: &Catalog,
    zone: &str,
    grid_source: &str,
    grid_name: Option<&str>,
    placement: &str,
) -> Result<Value> {
    let placement: Placement = placement.parse().map_err(|e: String| anyhow!(e))?;
    let mut source = catalog.gridded(grid_source)?;
    let lon = source.lon(placement)?;
    let lat = source.lat(placement)?;
    if lon.ndim() != 1 || lat.ndim() != 1 {
        bail!("coordinates of '{}' are not 1-D", grid_source);
    }

    let masks = ZoneMasks::from_paths(catalog.paths());
    let grid_name = grid_name.unwrap_or(grid_source);
    let mask = masks.mask(zone, grid_name, &lon.values(), &lat.values())?;

    Ok(json!({
        "zone": zone,
        "name": zone_display_name(zone),
        "grid": grid_name,
        "shape": mask.shape(),
        "inside": mask.iter().filter(|&&inside| inside).count(),
        "cache": masks.cache_path(zone, grid_name).display().to_string(),
    }))
}

/// Reduction over the named dimensions; none means all.
fn reduction_for(dims: &[String], wanted: &[String]) -> Result<Reduction> {
    if wanted.is_empty() {
        return Ok(Reduction::All);
    }
    let axes = wanted
        .iter()
        .map(|w| {
            dims.iter()
                .position(|d| d == w)
                .ok_or_else(|| anyhow!("unknown dimension '{}', expected one of {:?}", w, dims))
        })
        .collect::<Result<Vec<usize>>>()?;
    Ok(Reduction::Axes(axes))
}

fn summarise_dataset(ds: &Dataset) -> Value {
    let variables: Vec<Value> = ds
        .variables()
        .map(|(name, var)| {
            let values = var.values();
            let valid: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
            let mean = if valid.is_empty() {
                f64::NAN
            } else {
                valid.iter().sum::<f64>() / valid.len() as f64
            };
            json!({
                "name": name,
                "quantity": units::by_name(name).map(|u| u.to_string()),
                "dims": var.dims,
                "shape": var.shape(),
                "mean": mean,
            })
        })
        .collect();
    json!({
        "kind": "grid",
        "dims": ds.dims(),
        "chunks": ds.chunks(),
        "variables": variables,
    })
}

fn summarise_table(table: &Table) -> Value {
    json!({
        "kind": "table",
        "rows": table.n_rows(),
        "columns": table.column_names(),
    })
}

/// Indented `key: value` rendering of a JSON result.
pub fn render_text(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out.trim_end().to_string()
}

fn is_leaf(value: &Value) -> bool {
    match value {
        Value::Object(_) => false,
        Value::Array(items) => items.iter().all(|i| !matches!(i, Value::Object(_) | Value::Array(_))),
        _ => true,
    }
}

fn leaf_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(leaf_text).collect::<Vec<_>>().join(", ")
        ),
        other => other.to_string(),
    }
}

fn write_value(out: &mut String, value: &Value, indent: usize) {
    let pad = " ".repeat(indent);
    match value {
        Value::Object(map) => write_object(out, map, indent),
        Value::Array(items) if !is_leaf(value) => {
            for item in items {
                out.push_str(&format!("{}-\n", pad));
                write_value(out, item, indent + 2);
            }
        }
        leaf => out.push_str(&format!("{}{}\n", pad, leaf_text(leaf))),
    }
}

fn write_object(out: &mut String, map: &Map<String, Value>, indent: usize) {
    let pad = " ".repeat(indent);
    for (key, value) in map {
        if is_leaf(value) {
            out.push_str(&format!("{}{}: {}\n", pad, key, leaf_text(value)));
        } else {
            out.push_str(&format!("{}{}:\n", pad, key));
            write_value(out, value, indent + 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_access::ProjectPaths;
    use test_utils::{assert_approx_eq, ostia_sst, ScratchProject};

    const CATALOG: &str = r#"
model:
  file_type: netcdf
  file_path: OSTIA/model.nc
  data_type: satellite
  cleaning: ostia
reference:
  file_type: netcdf
  file_path: OSTIA/reference.nc
  data_type: satellite
  cleaning: ostia
"#;

    fn project() -> (ScratchProject, Catalog) {
        let project = ScratchProject::new();
        let dir = project.create_dir("data/01_raw/OSTIA");
        netcdf_parser::write_dataset(dir.join("model.nc"), &ostia_sst(&[300.15, 301.15])).unwrap();
        netcdf_parser::write_dataset(dir.join("reference.nc"), &ostia_sst(&[299.15, 299.15])).unwrap();
        project.write_catalog("ostia.yml", CATALOG);
        let catalog = Catalog::from_paths(ProjectPaths::at(project.root())).unwrap();
        (project, catalog)
    }

    fn request<'a>(metric: &'a str, dims: &'a [String]) -> CompareRequest<'a> {
        CompareRequest {
            name: "model",
            reference: "reference",
            variable: "tem",
            metric,
            dims,
            pattern: "",
        }
    }

    #[test]
    fn test_reduction_for_dims() {
        let dims: Vec<String> = ["time", "lat", "lon"].iter().map(|s| s.to_string()).collect();
        assert_eq!(reduction_for(&dims, &[]).unwrap(), Reduction::All);
        assert_eq!(
            reduction_for(&dims, &["lon".to_string(), "time".to_string()]).unwrap(),
            Reduction::Axes(vec![2, 0])
        );
        assert!(reduction_for(&dims, &["depth".to_string()]).is_err());
    }

    #[test]
    fn test_compare_rmse() {
        let (_project, catalog) = project();
        let result = compare(&catalog, &request("rmse", &[])).unwrap();
        assert_eq!(result["shape"], json!([]));
        assert_approx_eq!(result["values"][0].as_f64().unwrap(), 2.5f64.sqrt(), 1e-9);
    }

    #[test]
    fn test_compare_keeps_dims() {
        let (_project, catalog) = project();
        let dims = vec!["time".to_string(), "lat".to_string()];
        let result = compare(&catalog, &request("bias", &dims)).unwrap();
        assert_eq!(result["dims"], json!(["lon"]));
        assert_approx_eq!(result["values"][0].as_f64().unwrap(), 1.0, 1e-9);
        assert_approx_eq!(result["values"][1].as_f64().unwrap(), 2.0, 1e-9);
    }

    #[test]
    fn test_compare_unknown_metric() {
        let (_project, catalog) = project();
        assert!(compare(&catalog, &request("nse", &[])).is_err());
    }

    #[test]
    fn test_show_and_export() {
        let (project, catalog) = project();
        let summary = show(&catalog, "model", "").unwrap();
        assert_eq!(summary["kind"], json!("grid"));
        assert_eq!(summary["source"], json!("model"));
        let tem = summary["variables"]
            .as_array()
            .unwrap()
            .iter()
            .find(|v| v["name"] == json!("tem"))
            .unwrap();
        assert_eq!(tem["quantity"], json!("T [°C]"));

        let output = project.root().join("model_clean.nc");
        export(&catalog, "model", &output, "").unwrap();
        let written = netcdf_parser::read_dataset(&output).unwrap();
        assert!(written.contains("tem"));
    }

    #[test]
    fn test_sources_listing() {
        let (_project, catalog) = project();
        let listing = sources(&catalog).unwrap();
        assert_eq!(listing["sources"].as_array().unwrap().len(), 2);
        assert_eq!(listing["sources"][0]["cleaning"], json!("ostia"));
    }

    #[test]
    fn test_render_text() {
        let value = json!({ "zone": "SCS", "shape": [2, 3], "cache": null });
        let text = render_text(&value);
        assert!(text.contains("zone: SCS"));
        assert!(text.contains("shape: [2, 3]"));
        assert!(text.contains("cache: -"));
    }
}
