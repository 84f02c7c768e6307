//! # Model-Path Document Generator
//!
//! Reads the deployment configuration and emits the
//! `extra_model_paths.yaml` document ComfyUI uses to locate models, custom
//! nodes, and other assets. Each model category maps to one or more search
//! directories, encoded as a newline-separated block so ComfyUI searches
//! them in order.
//!
//! The pipeline is linear with no resume or retry:
//! load config -> filesystem config -> model paths -> emit -> validate.

mod defaults;
mod generator;

pub use generator::{APP_KEY, FilesystemConfig, GenerateReport, ModelPathsGenerator};
