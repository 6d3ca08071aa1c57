//! Partition clustering of embedding rows

pub mod kmeans;

pub use self::kmeans::{KMeans, KMeansResult};
