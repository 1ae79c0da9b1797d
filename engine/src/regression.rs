//! Engine-level regression helpers built on frame hashes.
//!
//! A scenario is stepped through a `HeadlessRunner`; every recorded state is rendered into an
//! offscreen RGBA buffer by a caller-provided closure and reduced to a SHA-256 digest. Those
//! digests can be compared between runs or against a golden JSON file.

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{GameLogic, HeadlessRunner};

pub fn rgba_sha256_hex(rgba: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rgba);
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameHashGolden {
    pub version: u32,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub hash_alg: String,
    /// One hash per recorded state.
    pub hashes: Vec<String>,
}

impl FrameHashGolden {
    pub fn new(name: impl Into<String>, width: u32, height: u32, hashes: Vec<String>) -> Self {
        Self {
            version: 1,
            name: name.into(),
            width,
            height,
            hash_alg: "sha256".to_string(),
            hashes,
        }
    }
}

pub fn load_golden_json(path: impl AsRef<Path>) -> io::Result<FrameHashGolden> {
    let path = path.as_ref();
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("failed parsing golden json {}: {e}", path.display()),
        )
    })
}

pub fn save_golden_json(path: impl AsRef<Path>, golden: &FrameHashGolden) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = fs::File::create(path)?;
    let mut writer = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, golden).map_err(io::Error::other)?;
    writer.flush()?;
    Ok(())
}

/// Compares `golden` with the file at `path`; writes the file when it is missing or `update`
/// is set.
pub fn assert_or_update_golden_json(
    path: impl AsRef<Path>,
    golden: &FrameHashGolden,
    update: bool,
) -> io::Result<()> {
    let path = path.as_ref();
    let exists = path.exists();

    if update || !exists {
        save_golden_json(path, golden)?;
        if exists {
            tracing::info!(path = %path.display(), "updated golden");
        } else {
            tracing::info!(path = %path.display(), "wrote golden");
        }
        return Ok(());
    }

    let expected = load_golden_json(path)?;
    if expected.version != golden.version
        || expected.hash_alg != golden.hash_alg
        || expected.width != golden.width
        || expected.height != golden.height
    {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "golden metadata mismatch at {}:\nexpected: v{} alg={} {}x{}\nactual:   v{} alg={} {}x{}",
                path.display(),
                expected.version,
                expected.hash_alg,
                expected.width,
                expected.height,
                golden.version,
                golden.hash_alg,
                golden.width,
                golden.height
            ),
        ));
    }

    if expected.hashes.len() != golden.hashes.len() {
        return Err(io::Error::other(format!(
            "golden frame count mismatch at {}: expected {} hashes, got {}",
            path.display(),
            expected.hashes.len(),
            golden.hashes.len()
        )));
    }

    for (i, (a, b)) in expected.hashes.iter().zip(golden.hashes.iter()).enumerate() {
        if a != b {
            return Err(io::Error::other(format!(
                "golden mismatch at {} (frame {i}):\nexpected: {a}\nactual:   {b}",
                path.display()
            )));
        }
    }

    Ok(())
}

/// Renders every state in the runner's history and hashes each frame.
pub fn history_render_hashes<G, Render>(
    runner: &HeadlessRunner<G>,
    width: u32,
    height: u32,
    mut render: Render,
) -> Vec<String>
where
    G: GameLogic,
    Render: FnMut(&G::State, &mut [u8], u32, u32),
{
    let len = (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4);
    let mut buf = vec![0u8; len];
    runner
        .history()
        .iter()
        .map(|state| {
            buf.fill(0);
            render(state, &mut buf, width, height);
            rgba_sha256_hex(&buf)
        })
        .collect()
}

/// Runs `inputs` through two fresh runners and returns both hash sequences.
pub fn run_twice_and_hash<G, Render>(
    game: G,
    inputs: &[G::Input],
    width: u32,
    height: u32,
    mut render: Render,
) -> (Vec<String>, Vec<String>)
where
    G: GameLogic + Clone,
    G::Input: Clone,
    Render: FnMut(&G::State, &mut [u8], u32, u32),
{
    let mut first = HeadlessRunner::new(game.clone());
    first.run(inputs.iter().cloned());
    let mut second = HeadlessRunner::new(game);
    second.run(inputs.iter().cloned());

    (
        history_render_hashes(&first, width, height, &mut render),
        history_render_hashes(&second, width, height, &mut render),
    )
}
