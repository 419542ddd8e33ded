use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dasp_signal::{rate, Signal};
use sigflow::blocks::{DecimFirCc, DecimFirConfig, DecimFirFf};
use sigflow::firdes;
use sigflow::kernel::{Complex32, KernelLifecycle, StreamKernel};
use sigflow::windows::Window;

fn tone(samp_rate: f64, hz: f64, len: usize) -> Vec<f32> {
    let mut signal = rate(samp_rate).const_hz(hz).sine();
    (0..len).map(|_| signal.next() as f32).collect()
}

fn decim_fir_f32(c: &mut Criterion) {
    for decimation in [2usize, 8] {
        let cfg = DecimFirConfig::new(decimation, 48_000.0, 4_000.0, 1_000.0);
        let mut kernel = DecimFirFf::try_new(cfg).expect("valid decimator config");
        let lookback = kernel.required_lookback();

        let window = tone(48_000.0, 1_000.0, lookback + 4096 * decimation);
        let mut out = vec![0.0f32; 4096];

        c.bench_function(&format!("decim_fir_ff_d{decimation}"), |b| {
            b.iter(|| {
                black_box(
                    kernel
                        .process_into(window.as_slice(), &mut out[..])
                        .expect("aligned benchmark window"),
                );
            });
        });
    }
}

fn decim_fir_complex(c: &mut Criterion) {
    let decimation = 4usize;
    let cfg = DecimFirConfig::new(decimation, 48_000.0, 4_000.0, 1_000.0);
    let mut kernel = DecimFirCc::try_new(cfg).expect("valid decimator config");
    let lookback = kernel.required_lookback();

    let len = lookback + 4096 * decimation;
    let re = tone(48_000.0, 1_000.0, len);
    let im = tone(48_000.0, 1_300.0, len);
    let window: Vec<Complex32> = re
        .into_iter()
        .zip(im)
        .map(|(re, im)| Complex32::new(re, im))
        .collect();
    let mut out = vec![Complex32::new(0.0, 0.0); 4096];

    c.bench_function("decim_fir_cc_d4", |b| {
        b.iter(|| {
            black_box(
                kernel
                    .process_into(window.as_slice(), &mut out[..])
                    .expect("aligned benchmark window"),
            );
        });
    });
}

fn firdes_kaiser_design(c: &mut Criterion) {
    c.bench_function("firdes_low_pass_kaiser", |b| {
        b.iter(|| {
            black_box(
                firdes::low_pass::<f64>(
                    1.0,
                    48_000.0,
                    4_000.0,
                    500.0,
                    &Window::Kaiser { beta: 6.76 },
                )
                .expect("valid design parameters"),
            );
        });
    });
}

criterion_group!(benches, decim_fir_f32, decim_fir_complex, firdes_kaiser_design);
criterion_main!(benches);
