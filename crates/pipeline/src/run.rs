//! Staged pipeline runner
//!
//! Stages run strictly in order and each one consumes the full output of
//! the previous one. The first failure stops the run and is reported with
//! the stage it happened in.

use crate::config::{ClassifierKind, PipelineConfig};
use crate::loader::load_band_stack;
use crate::locator::{BandLocator, SafeProductLocator};
use crate::persist::{write_class_mapping, write_raster, write_samples_csv};
use crate::polygons::load_feature_polygons;
use clipper_algorithms::classification::{classify, fit_samples, Classifier, MaximumLikelihood, MinimumDistance};
use clipper_algorithms::{extract_samples, rasterize};
use clipper_core::{ClassMapping, Error, UNCLASSIFIED};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configure,
    LoadPolygons,
    LoadBands,
    Rasterize,
    Extract,
    PersistCsv,
    PersistMapping,
    Classify,
    PersistRaster,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Configure => "configure",
            Stage::LoadPolygons => "load_polygons",
            Stage::LoadBands => "load_bands",
            Stage::Rasterize => "rasterize",
            Stage::Extract => "extract",
            Stage::PersistCsv => "persist_csv",
            Stage::PersistMapping => "persist_mapping",
            Stage::Classify => "classify",
            Stage::PersistRaster => "persist_raster",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed run: the stage and the underlying error
#[derive(Error, Debug)]
#[error("pipeline failed at stage {stage}: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl PipelineError {
    pub fn new(stage: Stage, source: Error) -> Self {
        Self { stage, source }
    }
}

/// Attach a stage to a core result
trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T> AtStage<T> for clipper_core::Result<T> {
    fn at(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|source| PipelineError::new(stage, source))
    }
}

/// Summary of a successful run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub mapping: ClassMapping,
    /// Sample rows per class name, in class id order
    pub class_counts: Vec<(String, usize)>,
    pub total_samples: usize,
    /// Class map pixels left at 0 because a band value was missing
    pub unclassified_pixels: usize,
    pub csv_path: PathBuf,
    pub raster_path: PathBuf,
    pub mapping_path: Option<PathBuf>,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Classes: {}", self.mapping.len())?;
        for (name, count) in &self.class_counts {
            let id = self.mapping.id(name).unwrap_or(UNCLASSIFIED);
            writeln!(f, "  {:>3}  {:<24} {:>10} samples", id, name, count)?;
        }
        writeln!(f, "Total samples: {}", self.total_samples)?;
        writeln!(f, "Unclassified pixels: {}", self.unclassified_pixels)?;
        writeln!(f, "Samples: {}", self.csv_path.display())?;
        if let Some(path) = &self.mapping_path {
            writeln!(f, "Class mapping: {}", path.display())?;
        }
        write!(f, "Class map: {}", self.raster_path.display())
    }
}

/// Run every stage with the given band locator and classifier.
pub fn run<L, C>(config: &PipelineConfig, locator: &L, classifier: &C) -> Result<PipelineReport, PipelineError>
where
    L: BandLocator + ?Sized,
    C: Classifier,
{
    config.validate().at(Stage::Configure)?;
    let target = config.target_crs();

    info!(stage = %Stage::LoadPolygons, path = %config.polygons_path.display());
    let features = load_feature_polygons(&config.polygons_path, &target).at(Stage::LoadPolygons)?;

    info!(stage = %Stage::LoadBands, resolution = %config.resolution, bands = config.bands.len());
    let stack = load_band_stack(locator, config.resolution, &config.bands, &config.sensor).at(Stage::LoadBands)?;

    info!(stage = %Stage::Rasterize, features = features.len());
    let (mask, mapping) = rasterize(&stack.grid(), &features).at(Stage::Rasterize)?;
    for (name, id) in mapping.iter() {
        info!(class = name, id, "class");
    }

    info!(stage = %Stage::Extract);
    let table = extract_samples(&stack, &mask, &mapping).at(Stage::Extract)?;
    let counts = table.class_counts();
    let class_counts: Vec<(String, usize)> = mapping
        .iter()
        .map(|(name, id)| (name.to_string(), counts.get(&id).copied().unwrap_or(0)))
        .collect();
    info!(samples = table.len(), "extracted samples");

    info!(stage = %Stage::PersistCsv, path = %config.csv_output_path.display());
    write_samples_csv(&table, &config.csv_output_path).at(Stage::PersistCsv)?;

    if let Some(path) = &config.mapping_output_path {
        info!(stage = %Stage::PersistMapping, path = %path.display());
        write_class_mapping(&mapping, path).at(Stage::PersistMapping)?;
    }

    info!(stage = %Stage::Classify, classifier = classifier.name());
    let model = fit_samples(&table, classifier).at(Stage::Classify)?;
    let classmap = classify(&stack, &model).at(Stage::Classify)?;
    let unclassified_pixels = classmap.count_equal(UNCLASSIFIED);

    info!(stage = %Stage::PersistRaster, path = %config.raster_output_path.display());
    write_raster(&config.raster_output_path, &stack, &classmap).at(Stage::PersistRaster)?;

    Ok(PipelineReport {
        mapping,
        class_counts,
        total_samples: table.len(),
        unclassified_pixels,
        csv_path: config.csv_output_path.clone(),
        raster_path: config.raster_output_path.clone(),
        mapping_path: config.mapping_output_path.clone(),
    })
}

/// Run against the configured `.SAFE` product with the configured classifier.
pub fn run_with_config(config: &PipelineConfig) -> Result<PipelineReport, PipelineError> {
    let locator = SafeProductLocator::new(&config.product_root);
    match config.classifier {
        ClassifierKind::MinimumDistance => run(config, &locator, &MinimumDistance),
        ClassifierKind::MaximumLikelihood => run(config, &locator, &MaximumLikelihood),
    }
}
