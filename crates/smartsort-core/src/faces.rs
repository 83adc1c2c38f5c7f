//! Greedy incremental face clustering.
//!
//! Images are visited once, in enumeration order. Each extracted vector joins
//! the first existing cluster (in creation order) holding a vector closer than
//! the match threshold, or starts a new cluster. Clusters are never merged or
//! revisited, so the grouping depends on processing order.

use crate::classifier::{classify, Category};
use crate::error::Error;
use crate::operation::OperationContext;
use crate::placement::{place, PlaceMode};
use crate::scanner::scan_files;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub type FeatureVector = Vec<f32>;

pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.6;
pub const FACES_DIRNAME: &str = "Faces";

/// External capability producing one feature vector per detected face.
///
/// Returns an empty list when the image has no faces or cannot be read.
pub trait FaceVectorExtractor: Send + Sync {
    fn extract(&self, image: &Path) -> Vec<FeatureVector>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FaceOptions {
    pub recursive: bool,
    pub match_threshold: f32,
}

impl Default for FaceOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

/// Euclidean distance; vectors of different length never match.
pub fn face_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Vectors believed to depict one person, plus every image that contributed
/// at least one of them. Never empty.
#[derive(Debug, Clone)]
pub struct FaceCluster {
    vectors: Vec<FeatureVector>,
    images: Vec<PathBuf>,
}

impl FaceCluster {
    fn new(vector: FeatureVector, image: &Path) -> Self {
        Self {
            vectors: vec![vector],
            images: vec![image.to_path_buf()],
        }
    }

    fn min_distance(&self, vector: &[f32]) -> f32 {
        self.vectors
            .iter()
            .map(|known| face_distance(known, vector))
            .fold(f32::INFINITY, f32::min)
    }

    fn push(&mut self, vector: FeatureVector, image: &Path) {
        self.vectors.push(vector);
        if !self.images.iter().any(|known| known == image) {
            self.images.push(image.to_path_buf());
        }
    }

    pub fn vectors(&self) -> &[FeatureVector] {
        &self.vectors
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }
}

#[derive(Debug, Clone)]
pub struct FaceClusterer {
    threshold: f32,
    clusters: Vec<FaceCluster>,
}

impl FaceClusterer {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            clusters: Vec::new(),
        }
    }

    /// Fold every vector extracted from `image` into the clusters.
    pub fn add_image(&mut self, image: &Path, vectors: Vec<FeatureVector>) {
        for vector in vectors {
            let matched = self
                .clusters
                .iter()
                .position(|cluster| cluster.min_distance(&vector) < self.threshold);
            match matched {
                Some(index) => self.clusters[index].push(vector, image),
                None => self.clusters.push(FaceCluster::new(vector, image)),
            }
        }
    }

    pub fn clusters(&self) -> &[FaceCluster] {
        &self.clusters
    }

    pub fn into_clusters(self) -> Vec<FaceCluster> {
        self.clusters
    }
}

/// One output collection. `outputs` lists the copies written under
/// `Faces/<name>`; on cancellation it holds only what was copied before the
/// token was seen.
#[derive(Debug, Clone)]
pub struct FaceAlbum {
    pub name: String,
    pub sources: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
}

pub fn build_face_albums(
    root: &Path,
    options: &FaceOptions,
    ignore_patterns: &[String],
    extractor: Option<&dyn FaceVectorExtractor>,
    ctx: &OperationContext,
) -> Result<Vec<FaceAlbum>, Error> {
    let Some(extractor) = extractor else {
        warn!("{}", Error::CapabilityUnavailable("Face recognition"));
        ctx.log("Face recognition is not available.");
        ctx.progress.finish();
        return Ok(Vec::new());
    };

    let photos: Vec<PathBuf> = scan_files(root, options.recursive, ignore_patterns, ctx.token())?
        .into_iter()
        .map(|file| file.path)
        .filter(|path| classify(path) == Category::Photos)
        .collect();

    if ctx.is_cancelled() {
        ctx.log("Face analysis cancelled.");
        ctx.progress.finish();
        return Ok(Vec::new());
    }

    if photos.is_empty() {
        ctx.log("No photos found.");
        ctx.progress.finish();
        return Ok(Vec::new());
    }

    let total = photos.len();
    ctx.log(format!("Analyzing faces in {} photos...", total));

    let mut clusterer = FaceClusterer::new(options.match_threshold);
    for (index, photo) in photos.iter().enumerate() {
        if ctx.is_cancelled() {
            break;
        }
        let vectors = extractor.extract(photo);
        clusterer.add_image(photo, vectors);
        ctx.progress.advance(index + 1, total);
    }

    let clusters = clusterer.into_clusters();
    let faces_dir = root.join(FACES_DIRNAME);
    let mut albums = Vec::with_capacity(clusters.len());
    for (index, cluster) in clusters.into_iter().enumerate() {
        let name = album_name(index);
        let outputs = if ctx.is_cancelled() {
            Vec::new()
        } else {
            materialize(&faces_dir.join(&name), &cluster.images, ctx)
        };
        albums.push(FaceAlbum {
            name,
            sources: cluster.images,
            outputs,
        });
    }

    ctx.progress.finish();
    if ctx.is_cancelled() {
        ctx.log("Face analysis cancelled.");
        return Ok(albums);
    }
    info!("{} face albums under {}", albums.len(), faces_dir.display());
    ctx.log(format!("Created {} face albums.", albums.len()));
    Ok(albums)
}

fn album_name(index: usize) -> String {
    format!("Person_{}", index + 1)
}

/// Copy `images` into `album_dir`, stopping at the first image that finds
/// the run cancelled. Returns the copies written.
fn materialize(album_dir: &Path, images: &[PathBuf], ctx: &OperationContext) -> Vec<PathBuf> {
    let mut outputs = Vec::with_capacity(images.len());
    for image in images {
        if ctx.is_cancelled() {
            break;
        }
        let Some(file_name) = image.file_name() else {
            continue;
        };
        match place(image, &album_dir.join(file_name), PlaceMode::Copy) {
            Ok(dest) => outputs.push(dest),
            Err(e) => {
                warn!("{}", e);
                ctx.log(format!("Error {}: {}", file_name.to_string_lossy(), e));
            }
        }
    }
    outputs
}
