//! # distance-server - Distance Metrics Web Service
//!
//! Computes distances between numeric points, renders distance charts as
//! PNG images and exports results in common file formats, all behind a
//! small JSON HTTP API.
//!
//! ## Overview
//!
//! The service is made of three independent parts:
//!
//! 1. **Distance engine** ([`distance`]) - euclidean, manhattan, cosine,
//!    hamming and jaccard distances, single pair or all pairs
//! 2. **Chart renderer** ([`chart`]) - scatter, heatmap, network, histogram
//!    and line charts, returned as base64 PNG
//! 3. **Exporter** ([`export`]) - json, csv, xml, excel, txt and html
//!
//! ## Usage
//!
//! ```bash
//! # Serve on the default address (127.0.0.1:5001)
//! distance-server
//!
//! # Custom address, open the front-end in a browser
//! distance-server --host 0.0.0.0 --port 8080 --open
//! ```
//!
//! ## Library use
//!
//! ```
//! use distance_server::{Metric, calculate};
//!
//! let result = calculate(vec![0.0, 0.0], vec![3.0, 4.0], Metric::Euclidean).unwrap();
//! assert_eq!(result.distance, 5.0);
//! ```

pub mod chart;
pub mod config;
pub mod distance;
pub mod export;
pub mod metadata;
pub mod web;

pub use chart::{
    ChartError, ChartKind, ChartRequest, ChartResponse, ChartStyle, DistanceInput, render_chart,
    render_chart_with_settings,
};
pub use config::{
    ChartSettings, ConfigError, ExportSettings, ServerSection, ServiceConfig, load_config,
    load_config_file,
};
pub use distance::{
    BatchResult, CalculationPair, DistanceError, Metric, PairwiseResult, batch_calculate,
    calculate, distance_matrix,
};
pub use export::{
    ExportError, ExportFormat, ExportResponse, export_filename, export_results,
    export_results_with_settings,
};
