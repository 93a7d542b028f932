// ============================================================
// Layer 5 — Compute Backend Selection
// ============================================================
// Burn code is generic over the Backend type parameter; this
// file picks the concrete types.
//
//   wgpu    — GPU through WebGPU (Vulkan / Metal / DX12)
//   ndarray — pure-Rust CPU fallback, also used by the tests

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub type WgpuBackend      = burn::backend::Wgpu;
pub type WgpuTrainBackend = burn::backend::Autodiff<WgpuBackend>;

pub type CpuBackend      = burn::backend::NdArray<f32>;
pub type CpuTrainBackend = burn::backend::Autodiff<CpuBackend>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputeBackend {
    Wgpu,
    NdArray,
}

impl FromStr for ComputeBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wgpu"            => Ok(ComputeBackend::Wgpu),
            "ndarray" | "cpu" => Ok(ComputeBackend::NdArray),
            other             => bail!("unknown backend '{other}' (expected 'wgpu' or 'ndarray')"),
        }
    }
}

impl fmt::Display for ComputeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeBackend::Wgpu    => write!(f, "wgpu"),
            ComputeBackend::NdArray => write!(f, "ndarray"),
        }
    }
}
