use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sigflow::blocks::{
    DecimFirConfig, DecimFirFf, FlexFirConfig, FlexFirFf, MovingAverage, MovingAverageConfig,
    MovingAverageHistory,
};
use sigflow::firdes;
use sigflow::kernel::{KernelLifecycle, StreamKernel};
use sigflow::windows::Window;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

const DEFAULT_PYTHON_BIN: &str = "python";

const PY_SIGNAL_SCRIPT: &str = r#"
import json
import sys
import time
import numpy as np

env = json.loads(sys.stdin.read())
op = env["op"]
iters = int(env["iters"])
p = env["payload"]

def _as_array(key):
    return np.asarray(p[key], dtype=float)

def _flat(v):
    return np.asarray(v, dtype=float).reshape(-1)

def _attenuation(win, beta):
    if win == "rectangular":
        return 21.0
    if win == "hann":
        return 44.0
    if win == "hamming":
        return 53.0
    if win == "blackman":
        return 74.0
    if win == "kaiser":
        return beta / 0.1102 + 8.7
    raise RuntimeError(f"unknown window: {win}")

def _window(win, beta, ntaps):
    if win == "rectangular":
        return np.ones(ntaps)
    if win == "hann":
        return np.hanning(ntaps)
    if win == "hamming":
        return np.hamming(ntaps)
    if win == "blackman":
        return np.blackman(ntaps)
    if win == "kaiser":
        return np.kaiser(ntaps, beta)
    raise RuntimeError(f"unknown window: {win}")

def _firdes():
    fs = float(p["samp_rate"])
    tw = float(p["transition_width"])
    gain = float(p["gain"])
    beta = float(p.get("beta") or 0.0)
    ntaps = int(_attenuation(p["window"], beta) * fs / (22.0 * tw))
    if ntaps % 2 == 0:
        ntaps += 1
    mid = (ntaps - 1) // 2
    m = np.arange(ntaps) - mid
    msafe = np.where(m == 0, 1, m)
    w = _window(p["window"], beta, ntaps)
    band = p["band"]
    if band == "low":
        wc = 2.0 * np.pi * float(p["cutoff"]) / fs
        h = np.sin(m * wc) / (msafe * np.pi)
        h[mid] = wc / np.pi
        h = h * w
        return h * (gain / np.sum(h))
    if band == "high":
        wc = 2.0 * np.pi * float(p["cutoff"]) / fs
        h = -np.sin(m * wc) / (msafe * np.pi)
        h[mid] = 1.0 - wc / np.pi
        h = h * w
        nyquist = np.sum(h * ((-1.0) ** np.abs(m)))
        return h * (gain / nyquist)
    if band == "band":
        w0 = 2.0 * np.pi * float(p["low_cutoff"]) / fs
        w1 = 2.0 * np.pi * float(p["high_cutoff"]) / fs
        h = (np.sin(m * w1) - np.sin(m * w0)) / (msafe * np.pi)
        h[mid] = (w1 - w0) / np.pi
        h = h * w
        center = 0.5 * (w0 + w1)
        return h * (gain / np.sum(h * np.cos(center * m)))
    raise RuntimeError(f"unknown band: {band}")

def _flex_taps():
    fs = float(p["samp_rate"])
    tw = max(float(p["transition_width"]), 1.0)
    gain = float(p["gain"])
    ntaps = int(np.ceil(4.0 * fs / tw)) | 1
    half = (ntaps - 1) // 2
    m = np.arange(ntaps) - half
    w = np.hamming(ntaps)
    mode = p["mode"]
    if mode == "lowpass":
        fc = float(p["freq1"]) / fs
        h = 2.0 * fc * np.sinc(2.0 * fc * m)
    elif mode == "highpass":
        fc = float(p["freq1"]) / fs
        h = -2.0 * fc * np.sinc(2.0 * fc * m)
        h[half] = 1.0 - 2.0 * fc
    elif mode == "bandpass":
        lo = min(float(p["freq1"]), float(p["freq2"]))
        hi = max(float(p["freq1"]), float(p["freq2"]))
        if hi <= lo:
            sep = p.get("band_separation")
            sep = fs * 0.01 if sep is None else float(sep)
            hi = min(lo + max(tw, sep), fs / 2.0)
        fl = lo / fs
        fh = hi / fs
        h = 2.0 * fh * np.sinc(2.0 * fh * m) - 2.0 * fl * np.sinc(2.0 * fl * m)
    else:
        raise RuntimeError(f"unknown mode: {mode}")
    return h * w * gain

def _compute():
    if op == "firdes":
        return _firdes()
    if op == "flex_taps":
        return _flex_taps()
    if op == "decim_fir":
        y = np.convolve(_as_array("x"), _as_array("taps"))
        return y[:: int(p["decimation"])][: int(p["produced"])]
    if op == "fir_stream":
        x = _as_array("x")
        return np.convolve(x, _as_array("taps"))[: x.size]
    if op == "moving_average":
        x = _as_array("x")
        n = int(p["length"])
        scale = float(p["scale"])
        full = np.convolve(x, np.ones(n))[: x.size]
        return np.where(np.arange(x.size) >= n - 1, full * scale / n, 0.0)
    if op == "moving_average_history":
        x = _as_array("x")
        n = int(p["length"])
        return np.convolve(x, np.ones(n) / n, mode="valid") * float(p["scale"])

    raise RuntimeError(f"unsupported op: {op}")

y = _flat(_compute())

t0 = time.perf_counter_ns()
for _ in range(iters):
    _compute()
t1 = time.perf_counter_ns()

print(json.dumps({
    "output": y.tolist(),
    "avg_ns": (t1 - t0) / max(iters, 1),
    "python_version": sys.version.split()[0],
    "numpy_version": np.__version__
}))
"#;

#[derive(Debug, Serialize, Deserialize, Clone)]
struct PythonEval {
    output: Vec<f64>,
    avg_ns: f64,
    python_version: String,
    numpy_version: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ContractRow {
    case_id: String,
    pearson_r: f64,
    mae: f64,
    rmse: f64,
    max_abs: f64,
    rust_ns: f64,
    python_ns: f64,
    speedup_vs_python: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContractBundle {
    generated_epoch_seconds: u64,
    python_executable: String,
    python_version: String,
    numpy_version: String,
    rows: Vec<ContractRow>,
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("contracts") => run_contracts(),
        _ => {
            eprintln!("Usage:");
            eprintln!("  cargo run -p xtask -- contracts");
            Ok(())
        }
    }
}

fn run_contracts() -> Result<()> {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let out_dir = PathBuf::from(format!("target/contracts/{ts}"));
    fs::create_dir_all(&out_dir).context("creating contract output directory")?;

    let python_bin = detect_python_bin();

    let mut rows = Vec::new();

    // Shared synthetic stream for the f32 cases: two tones at 48 kHz.
    let signal: Vec<f32> = (0..4096)
        .map(|i| {
            let t = i as f32 / 48_000.0;
            let a = 2.0 * std::f32::consts::PI * 1_000.0 * t;
            let b = 2.0 * std::f32::consts::PI * 9_000.0 * t;
            a.sin() + 0.4 * b.sin()
        })
        .collect();
    let signal_f64: Vec<f64> = signal.iter().map(|v| f64::from(*v)).collect();

    // Low-pass design, Hamming window
    {
        let case_id = "firdes_low_pass_hamming_f64";
        let candidate = firdes::low_pass(1.0f64, 48_000.0, 4_000.0, 1_000.0, &Window::Hamming)
            .map_err(|e| anyhow!("low-pass design failed: {e}"))?;
        let py = python_signal_eval(
            &python_bin,
            "firdes",
            json!({
                "band": "low",
                "window": "hamming",
                "gain": 1.0,
                "samp_rate": 48_000.0,
                "cutoff": 4_000.0,
                "transition_width": 1_000.0
            }),
            200,
        )?;
        let rust_ns = benchmark_avg_ns(200, || {
            firdes::low_pass(1.0f64, 48_000.0, 4_000.0, 1_000.0, &Window::Hamming)
                .map(|_| ())
                .map_err(|e| anyhow!("low-pass design benchmark failed: {e}"))
        })?;
        record_case(&mut rows, case_id, candidate, py, rust_ns)?;
    }

    // Low-pass design, Kaiser window
    {
        let case_id = "firdes_low_pass_kaiser_f64";
        let beta = 6.76f64;
        let window = Window::Kaiser { beta };
        let candidate = firdes::low_pass(2.0f64, 48_000.0, 4_000.0, 500.0, &window)
            .map_err(|e| anyhow!("kaiser design failed: {e}"))?;
        let py = python_signal_eval(
            &python_bin,
            "firdes",
            json!({
                "band": "low",
                "window": "kaiser",
                "beta": beta,
                "gain": 2.0,
                "samp_rate": 48_000.0,
                "cutoff": 4_000.0,
                "transition_width": 500.0
            }),
            200,
        )?;
        let rust_ns = benchmark_avg_ns(200, || {
            firdes::low_pass(2.0f64, 48_000.0, 4_000.0, 500.0, &window)
                .map(|_| ())
                .map_err(|e| anyhow!("kaiser design benchmark failed: {e}"))
        })?;
        record_case(&mut rows, case_id, candidate, py, rust_ns)?;
    }

    // High-pass design, Hamming window
    {
        let case_id = "firdes_high_pass_hamming_f64";
        let candidate = firdes::high_pass(1.0f64, 48_000.0, 8_000.0, 1_000.0, &Window::Hamming)
            .map_err(|e| anyhow!("high-pass design failed: {e}"))?;
        let py = python_signal_eval(
            &python_bin,
            "firdes",
            json!({
                "band": "high",
                "window": "hamming",
                "gain": 1.0,
                "samp_rate": 48_000.0,
                "cutoff": 8_000.0,
                "transition_width": 1_000.0
            }),
            200,
        )?;
        let rust_ns = benchmark_avg_ns(200, || {
            firdes::high_pass(1.0f64, 48_000.0, 8_000.0, 1_000.0, &Window::Hamming)
                .map(|_| ())
                .map_err(|e| anyhow!("high-pass design benchmark failed: {e}"))
        })?;
        record_case(&mut rows, case_id, candidate, py, rust_ns)?;
    }

    // Band-pass design, Blackman window
    {
        let case_id = "firdes_band_pass_blackman_f64";
        let candidate = firdes::band_pass(
            1.0f64,
            48_000.0,
            6_000.0,
            10_000.0,
            1_000.0,
            &Window::Blackman,
        )
        .map_err(|e| anyhow!("band-pass design failed: {e}"))?;
        let py = python_signal_eval(
            &python_bin,
            "firdes",
            json!({
                "band": "band",
                "window": "blackman",
                "gain": 1.0,
                "samp_rate": 48_000.0,
                "low_cutoff": 6_000.0,
                "high_cutoff": 10_000.0,
                "transition_width": 1_000.0
            }),
            200,
        )?;
        let rust_ns = benchmark_avg_ns(200, || {
            firdes::band_pass(
                1.0f64,
                48_000.0,
                6_000.0,
                10_000.0,
                1_000.0,
                &Window::Blackman,
            )
            .map(|_| ())
            .map_err(|e| anyhow!("band-pass design benchmark failed: {e}"))
        })?;
        record_case(&mut rows, case_id, candidate, py, rust_ns)?;
    }

    // Flexible low-pass tap design
    {
        let case_id = "flex_lowpass_taps_f32";
        let cfg = FlexFirConfig::lowpass(48_000.0, 4_000.0, 1_000.0, 1.0);
        let kernel = FlexFirFf::try_new(cfg.clone())
            .map_err(|e| anyhow!("flexible low-pass construction failed: {e}"))?;
        let candidate: Vec<f64> = kernel.taps().iter().map(|t| f64::from(*t)).collect();
        let py = python_signal_eval(
            &python_bin,
            "flex_taps",
            json!({
                "mode": "lowpass",
                "samp_rate": 48_000.0,
                "freq1": 4_000.0,
                "freq2": 0.0,
                "transition_width": 1_000.0,
                "gain": 1.0,
                "band_separation": null
            }),
            200,
        )?;
        let rust_ns = benchmark_avg_ns(200, || {
            FlexFirFf::try_new(cfg.clone())
                .map(|_| ())
                .map_err(|e| anyhow!("flexible low-pass benchmark failed: {e}"))
        })?;
        record_case(&mut rows, case_id, candidate, py, rust_ns)?;
    }

    // Flexible high-pass tap design
    {
        let case_id = "flex_highpass_taps_f32";
        let cfg = FlexFirConfig::highpass(48_000.0, 6_000.0, 2_000.0, 1.0);
        let kernel = FlexFirFf::try_new(cfg.clone())
            .map_err(|e| anyhow!("flexible high-pass construction failed: {e}"))?;
        let candidate: Vec<f64> = kernel.taps().iter().map(|t| f64::from(*t)).collect();
        let py = python_signal_eval(
            &python_bin,
            "flex_taps",
            json!({
                "mode": "highpass",
                "samp_rate": 48_000.0,
                "freq1": 6_000.0,
                "freq2": 0.0,
                "transition_width": 2_000.0,
                "gain": 1.0,
                "band_separation": null
            }),
            200,
        )?;
        let rust_ns = benchmark_avg_ns(200, || {
            FlexFirFf::try_new(cfg.clone())
                .map(|_| ())
                .map_err(|e| anyhow!("flexible high-pass benchmark failed: {e}"))
        })?;
        record_case(&mut rows, case_id, candidate, py, rust_ns)?;
    }

    // Flexible band-pass tap design
    {
        let case_id = "flex_bandpass_taps_f32";
        let cfg = FlexFirConfig::bandpass(48_000.0, 3_000.0, 6_000.0, 1_500.0, 1.0);
        let kernel = FlexFirFf::try_new(cfg.clone())
            .map_err(|e| anyhow!("flexible band-pass construction failed: {e}"))?;
        let candidate: Vec<f64> = kernel.taps().iter().map(|t| f64::from(*t)).collect();
        let py = python_signal_eval(
            &python_bin,
            "flex_taps",
            json!({
                "mode": "bandpass",
                "samp_rate": 48_000.0,
                "freq1": 3_000.0,
                "freq2": 6_000.0,
                "transition_width": 1_500.0,
                "gain": 1.0,
                "band_separation": null
            }),
            200,
        )?;
        let rust_ns = benchmark_avg_ns(200, || {
            FlexFirFf::try_new(cfg.clone())
                .map(|_| ())
                .map_err(|e| anyhow!("flexible band-pass benchmark failed: {e}"))
        })?;
        record_case(&mut rows, case_id, candidate, py, rust_ns)?;
    }

    // Decimating FIR over an aligned window
    {
        let case_id = "decim_fir_stream_f32";
        let decimation = 4usize;
        let cfg = DecimFirConfig::new(decimation, 48_000.0, 4_000.0, 2_000.0);
        let mut kernel =
            DecimFirFf::try_new(cfg).map_err(|e| anyhow!("decimator construction failed: {e}"))?;
        let taps: Vec<f64> = kernel.taps().iter().map(|t| f64::from(*t)).collect();

        let lookback = kernel.required_lookback();
        let mut window = vec![0.0f32; lookback];
        window.extend_from_slice(&signal);
        let mut out = vec![0.0f32; signal.len() / decimation];
        let progress = kernel
            .process_into(&window[..], &mut out[..])
            .map_err(|e| anyhow!("decimator execution failed: {e}"))?;
        let candidate: Vec<f64> = out[..progress.produced]
            .iter()
            .map(|v| f64::from(*v))
            .collect();

        let py = python_signal_eval(
            &python_bin,
            "decim_fir",
            json!({
                "taps": taps,
                "x": signal_f64,
                "decimation": decimation,
                "produced": progress.produced
            }),
            50,
        )?;
        let rust_ns = benchmark_avg_ns(100, || {
            kernel
                .process_into(&window[..], &mut out[..])
                .map(|_| ())
                .map_err(|e| anyhow!("decimator benchmark failed: {e}"))
        })?;
        record_case(&mut rows, case_id, candidate, py, rust_ns)?;
    }

    // Flexible FIR streamed one-for-one from zeroed history
    {
        let case_id = "flex_lowpass_stream_f32";
        let cfg = FlexFirConfig::lowpass(48_000.0, 2_000.0, 1_000.0, 1.0);
        let mut kernel = FlexFirFf::try_new(cfg)
            .map_err(|e| anyhow!("flexible stream construction failed: {e}"))?;
        let taps: Vec<f64> = kernel.taps().iter().map(|t| f64::from(*t)).collect();

        let mut out = vec![0.0f32; signal.len()];
        kernel
            .process_into(&signal[..], &mut out[..])
            .map_err(|e| anyhow!("flexible stream execution failed: {e}"))?;
        let candidate: Vec<f64> = out.iter().map(|v| f64::from(*v)).collect();

        let py = python_signal_eval(
            &python_bin,
            "fir_stream",
            json!({ "taps": taps, "x": signal_f64 }),
            50,
        )?;
        let rust_ns = benchmark_avg_ns(100, || {
            kernel
                .process_into(&signal[..], &mut out[..])
                .map(|_| ())
                .map_err(|e| anyhow!("flexible stream benchmark failed: {e}"))
        })?;
        record_case(&mut rows, case_id, candidate, py, rust_ns)?;
    }

    // Moving average with zero-filled warm-up
    {
        let case_id = "moving_average_f32";
        let length = 16usize;
        let scale = 2.0f32;
        let mut kernel = MovingAverage::try_new(MovingAverageConfig::new(length, scale))
            .map_err(|e| anyhow!("moving average construction failed: {e}"))?;

        let mut out = vec![0.0f32; signal.len()];
        kernel
            .process_into(&signal[..], &mut out[..])
            .map_err(|e| anyhow!("moving average execution failed: {e}"))?;
        let candidate: Vec<f64> = out.iter().map(|v| f64::from(*v)).collect();

        let py = python_signal_eval(
            &python_bin,
            "moving_average",
            json!({ "x": signal_f64, "length": length, "scale": scale }),
            50,
        )?;
        let rust_ns = benchmark_avg_ns(100, || {
            kernel
                .process_into(&signal[..], &mut out[..])
                .map(|_| ())
                .map_err(|e| anyhow!("moving average benchmark failed: {e}"))
        })?;
        record_case(&mut rows, case_id, candidate, py, rust_ns)?;
    }

    // Moving average over a host-maintained lookback window
    {
        let case_id = "moving_average_history_f32";
        let length = 16usize;
        let scale = 1.0f32;
        let mut kernel = MovingAverageHistory::try_new(MovingAverageConfig::new(length, scale))
            .map_err(|e| anyhow!("history average construction failed: {e}"))?;

        let mut out = vec![0.0f32; signal.len() - (length - 1)];
        kernel
            .process_into(&signal[..], &mut out[..])
            .map_err(|e| anyhow!("history average execution failed: {e}"))?;
        let candidate: Vec<f64> = out.iter().map(|v| f64::from(*v)).collect();

        let py = python_signal_eval(
            &python_bin,
            "moving_average_history",
            json!({ "x": signal_f64, "length": length, "scale": scale }),
            50,
        )?;
        let rust_ns = benchmark_avg_ns(100, || {
            kernel
                .process_into(&signal[..], &mut out[..])
                .map(|_| ())
                .map_err(|e| anyhow!("history average benchmark failed: {e}"))
        })?;
        record_case(&mut rows, case_id, candidate, py, rust_ns)?;
    }

    let version_probe = python_versions(&python_bin)?;

    let bundle = ContractBundle {
        generated_epoch_seconds: ts,
        python_executable: python_bin.to_string_lossy().into_owned(),
        python_version: version_probe.python_version,
        numpy_version: version_probe.numpy_version,
        rows,
    };

    write_summary_csv(&out_dir.join("summary.csv"), &bundle.rows)?;
    fs::write(
        out_dir.join("summary.json"),
        serde_json::to_vec_pretty(&bundle).context("serializing summary bundle")?,
    )
    .context("writing summary.json")?;

    println!("Contract artifacts generated in: {}", out_dir.display());
    println!("  - {}", out_dir.join("summary.csv").display());
    println!("  - {}", out_dir.join("summary.json").display());
    println!("  - cases: {}", bundle.rows.len());

    Ok(())
}

fn detect_python_bin() -> PathBuf {
    PathBuf::from(DEFAULT_PYTHON_BIN)
}

fn python_versions(python_bin: &Path) -> Result<PythonEval> {
    run_python_eval(
        python_bin,
        r#"
import json, sys
import numpy
payload = json.loads(sys.stdin.read())
print(json.dumps({
    "output": [],
    "avg_ns": 0.0,
    "python_version": sys.version.split()[0],
    "numpy_version": numpy.__version__
}))
"#,
        json!({}),
    )
}

fn python_signal_eval(
    python_bin: &Path,
    op: &str,
    payload: serde_json::Value,
    iters: usize,
) -> Result<PythonEval> {
    run_python_eval(
        python_bin,
        PY_SIGNAL_SCRIPT,
        json!({
            "op": op,
            "iters": iters,
            "payload": payload
        }),
    )
}

fn run_python_eval(
    python_bin: &Path,
    script: &str,
    payload: serde_json::Value,
) -> Result<PythonEval> {
    let mut child = Command::new(python_bin)
        .arg("-c")
        .arg(script)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning python interpreter at {}", python_bin.display()))?;

    {
        let stdin = child.stdin.as_mut().context("opening python stdin")?;
        let payload_bytes = serde_json::to_vec(&payload).context("serializing python payload")?;
        stdin
            .write_all(&payload_bytes)
            .context("writing payload to python stdin")?;
    }

    let output = child
        .wait_with_output()
        .context("waiting for python process")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("python execution failed: {stderr}");
    }
    let stdout = String::from_utf8(output.stdout).context("parsing python stdout utf8")?;
    let parsed: PythonEval = serde_json::from_str(stdout.trim()).context("parsing python json")?;
    Ok(parsed)
}

fn record_case(
    rows: &mut Vec<ContractRow>,
    case_id: &str,
    candidate: Vec<f64>,
    py: PythonEval,
    rust_ns: f64,
) -> Result<()> {
    ensure_same_length(case_id, &candidate, &py.output)?;
    rows.push(build_row(
        case_id,
        &candidate,
        &py.output,
        rust_ns,
        py.avg_ns,
    ));
    Ok(())
}

fn ensure_same_length(case_id: &str, a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        bail!(
            "case {case_id} has mismatched output lengths: left={}, right={}",
            a.len(),
            b.len()
        );
    }
    Ok(())
}

fn benchmark_avg_ns<F>(iters: usize, mut f: F) -> Result<f64>
where
    F: FnMut() -> Result<()>,
{
    let start = Instant::now();
    for _ in 0..iters {
        f()?;
    }
    Ok(start.elapsed().as_nanos() as f64 / iters as f64)
}

fn build_row(
    case_id: &str,
    rust_candidate: &[f64],
    python_reference: &[f64],
    rust_ns: f64,
    python_ns: f64,
) -> ContractRow {
    ContractRow {
        case_id: case_id.to_string(),
        pearson_r: pearson(rust_candidate, python_reference),
        mae: mean_abs_error(rust_candidate, python_reference),
        rmse: root_mean_squared_error(rust_candidate, python_reference),
        max_abs: max_abs_error(rust_candidate, python_reference),
        rust_ns,
        python_ns,
        speedup_vs_python: python_ns / rust_ns,
    }
}

fn mean_abs_error(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .sum::<f64>()
        / a.len() as f64
}

fn root_mean_squared_error(a: &[f64], b: &[f64]) -> f64 {
    (a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        / a.len() as f64)
        .sqrt()
}

fn max_abs_error(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let da = *x - mean_a;
        let db = *y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a == 0.0 || var_b == 0.0 {
        if a == b {
            1.0
        } else {
            0.0
        }
    } else {
        cov / (var_a.sqrt() * var_b.sqrt())
    }
}

fn write_summary_csv(path: &Path, rows: &[ContractRow]) -> Result<()> {
    let mut out = String::new();
    out.push_str("case_id,pearson_r,mae,rmse,max_abs,rust_ns,python_ns,speedup_vs_python\n");
    for row in rows {
        out.push_str(&format!(
            "{},{:.12},{:.12},{:.12},{:.12},{:.3},{:.3},{:.6}\n",
            row.case_id,
            row.pearson_r,
            row.mae,
            row.rmse,
            row.max_abs,
            row.rust_ns,
            row.python_ns,
            row.speedup_vs_python,
        ));
    }
    fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}
