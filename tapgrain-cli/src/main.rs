//! tapgrain CLI: granulate a built-in test signal, live or offline.

mod source;

use source::{Source, SourceKind};
use std::error::Error;
use tapgrain_engine::{Controls, Granular, GranularConfig, Port};

#[cfg(feature = "realtime")]
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// Offline rendering block size.
const RENDER_BLOCK: usize = 256;
const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// `--flag=` prefixes that map straight onto control ports.
const CONTROL_FLAGS: [(&str, Port); 10] = [
    ("--min-delay=", Port::MinDelay),
    ("--max-delay=", Port::MaxDelay),
    ("--min-length=", Port::MinLength),
    ("--max-length=", Port::MaxLength),
    ("--min-cooldown=", Port::MinCooldown),
    ("--max-cooldown=", Port::MaxCooldown),
    ("--min-gain=", Port::MinGain),
    ("--max-gain=", Port::MaxGain),
    ("--slots=", Port::Slots),
    ("--gain=", Port::MasterGain),
];

#[derive(Debug, Default)]
struct Args {
    list_devices: bool,
    device_name: Option<String>,
    sample_rate: Option<u32>,
    channels: Option<u16>,
    duration_sec: Option<u64>,
    source: Option<String>,
    seed: Option<u64>,
    max_slots: Option<usize>,
    ring_seconds: Option<f32>,
    render_sec: Option<f32>,
    controls: Controls,
}

fn parse_args() -> Args {
    let mut a = Args::default();
    'args: for s in std::env::args().skip(1) {
        if s == "--list-devices" { a.list_devices = true; continue; }
        if let Some(rest) = s.strip_prefix("--device=")       { a.device_name  = Some(rest.to_string()); continue; }
        if let Some(rest) = s.strip_prefix("--sample-rate=")  { a.sample_rate  = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--channels=")     { a.channels     = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--duration=")     { a.duration_sec = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--source=")       { a.source       = Some(rest.to_string()); continue; }
        if let Some(rest) = s.strip_prefix("--seed=")         { a.seed         = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--max-slots=")    { a.max_slots    = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--ring-seconds=") { a.ring_seconds = rest.parse().ok();      continue; }
        if let Some(rest) = s.strip_prefix("--render=")       { a.render_sec   = rest.parse().ok();      continue; }
        for (flag, port) in CONTROL_FLAGS {
            if let Some(rest) = s.strip_prefix(flag) {
                match rest.parse::<f32>() {
                    Ok(v) => { a.controls.set(port, v); }
                    Err(_) => log::warn!("ignoring non-numeric value for {}: {rest}", port.name()),
                }
                continue 'args;
            }
        }
        log::warn!("unknown arg: {s}");
    }
    a
}

fn engine_config(args: &Args) -> GranularConfig {
    let mut config = GranularConfig::default();
    if let Some(n) = args.max_slots { config = config.with_max_slots(n); }
    if let Some(s) = args.ring_seconds { config = config.with_max_delay_seconds(s); }
    if let Some(seed) = args.seed { config = config.with_seed(seed); }
    config
}

fn make_source(args: &Args, sample_rate: u32) -> Result<Source, Box<dyn Error>> {
    let name = args.source.as_deref().unwrap_or("impulse");
    let kind = SourceKind::parse(name).ok_or_else(|| format!("unknown source: {name}"))?;
    Ok(Source::new(kind, sample_rate, args.seed.unwrap_or(0)))
}

#[derive(Debug, Default, Clone, Copy)]
struct ChannelStats {
    peak: f32,
    sum_sq: f64,
}

impl ChannelStats {
    fn add(&mut self, x: f32) {
        self.peak = self.peak.max(x.abs());
        self.sum_sq += f64::from(x) * f64::from(x);
    }

    #[allow(clippy::cast_precision_loss)]
    fn rms(&self, frames: usize) -> f64 {
        if frames == 0 { 0.0 } else { (self.sum_sq / frames as f64).sqrt() }
    }
}

/// Render `seconds` of output in fixed blocks and report level statistics.
fn render_offline(args: &Args, seconds: f32) -> Result<(), Box<dyn Error>> {
    let sr = args.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
    let mut engine = Granular::new(sr, &engine_config(args))?;
    let mut source = make_source(args, sr)?;
    let params = engine.resolve(&args.controls);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = (seconds.max(0.0) * sr as f32).round() as usize;
    log::info!("rendering {total} frames at {sr} Hz in blocks of {RENDER_BLOCK}");

    let mut input = [0.0f32; RENDER_BLOCK];
    let mut out_l = [0.0f32; RENDER_BLOCK];
    let mut out_r = [0.0f32; RENDER_BLOCK];
    let (mut left, mut right) = (ChannelStats::default(), ChannelStats::default());

    let mut done = 0;
    while done < total {
        let n = (total - done).min(RENDER_BLOCK);
        for x in &mut input[..n] { *x = source.next(); }
        engine.process([&input[..n], &input[..n]], [&mut out_l[..n], &mut out_r[..n]], &params);
        for i in 0..n {
            left.add(out_l[i]);
            right.add(out_r[i]);
        }
        done += n;
    }

    println!("Rendered {total} frames ({seconds:.2} s) with {} grain(s)", engine.initialized_slots());
    println!("left : peak {:.4}  rms {:.4}", left.peak, left.rms(total));
    println!("right: peak {:.4}  rms {:.4}", right.peak, right.rms(total));
    Ok(())
}

/// Report the chosen device, stream config and engine settings.
#[cfg_attr(not(feature = "realtime"), allow(dead_code))]
fn log_selection(device: &str, cfg: &dyn std::fmt::Debug, format: &dyn std::fmt::Debug, args: &Args) {
    log::info!("using device: {device}");
    log::info!("stream config: {cfg:?} (sample_format: {format:?})");
    log::info!(
        "source: {}  | slots: {}  | gain: {:.2}",
        args.source.as_deref().unwrap_or("impulse"),
        args.controls.slots,
        args.controls.master_gain,
    );
    if let Some(d) = args.duration_sec {
        log::info!("auto-stop after {d} seconds");
    }
}

#[cfg(feature = "realtime")]
fn list_output_devices() -> Result<(), Box<dyn Error>> {
    let host = cpal::default_host();
    println!("Available output devices:");
    for dev in host.output_devices()? {
        println!("- {}", dev.name()?);
    }
    Ok(())
}

#[cfg(feature = "realtime")]
fn pick_device(args: &Args) -> Result<cpal::Device, Box<dyn Error>> {
    let host = cpal::default_host();
    if let Some(name) = &args.device_name {
        for d in host.output_devices()? {
            if d.name()? == *name { return Ok(d); }
        }
        return Err(format!("requested device not found: {name}").into());
    }
    host.default_output_device()
        .ok_or_else(|| "no default output device".into())
}

#[cfg(feature = "realtime")]
fn choose_config(
    device: &cpal::Device,
    req_sr: Option<u32>,
    req_ch: Option<u16>,
) -> Result<cpal::SupportedStreamConfig, Box<dyn Error>> {
    if req_sr.is_none() && req_ch.is_none() {
        return Ok(device.default_output_config()?);
    }

    let mut best: Option<(u64, cpal::SupportedStreamConfigRange)> = None;
    for range in device.supported_output_configs()? {
        let ch     = range.channels();
        let sr_min = range.min_sample_rate().0;
        let sr_max = range.max_sample_rate().0;

        let ch_pen = match req_ch { Some(c) => u64::from(ch.abs_diff(c)), None => 0 };
        let sr_pen = match req_sr {
            Some(sr) if (sr_min..=sr_max).contains(&sr) => 0,
            Some(sr) => u64::from(sr_min.abs_diff(sr).min(sr_max.abs_diff(sr))),
            None => 0,
        };

        let score = sr_pen.saturating_mul(1000) + ch_pen;
        if best.as_ref().map_or(true, |(s, _)| score < *s) {
            best = Some((score, range));
        }
    }

    let (_, range) = best.ok_or_else(|| "no supported output configs".to_string())?;

    let pick_sr = match req_sr {
        Some(sr) => cpal::SampleRate(sr.clamp(range.min_sample_rate().0, range.max_sample_rate().0)),
        None => range.max_sample_rate(),
    };

    Ok(range.with_sample_rate(pick_sr))
}

#[cfg(feature = "realtime")]
fn build_stream<T>(
    device: &cpal::Device,
    cfg: &cpal::StreamConfig,
    mut engine: Granular,
    mut source: Source,
    controls: Controls,
    err_fn: impl Fn(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream, Box<dyn Error>>
where
    T: cpal::Sample + cpal::FromSample<f32> + cpal::SizedSample + Send + 'static,
{
    let channels = usize::from(cfg.channels).max(1);
    let params = engine.resolve(&controls);

    let stream = device.build_output_stream(
        cfg,
        move |output: &mut [T], _| {
            let frames = output.len() / channels;
            engine.process_with(
                frames,
                &params,
                |_| {
                    let s = source.next();
                    (s, s)
                },
                |i, (l, r)| {
                    let frame = &mut output[i * channels..(i + 1) * channels];
                    let mid = T::from_sample((0.5 * (l + r)).clamp(-1.0, 1.0));
                    for (ch, out) in frame.iter_mut().enumerate() {
                        *out = match (channels, ch) {
                            (1, _) => mid,
                            (_, 0) => T::from_sample(l.clamp(-1.0, 1.0)),
                            (_, 1) => T::from_sample(r.clamp(-1.0, 1.0)),
                            _ => mid,
                        };
                    }
                },
            );
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

#[cfg(feature = "realtime")]
fn play_realtime(args: &Args) -> Result<(), Box<dyn Error>> {
    use std::time::Duration;

    let device  = pick_device(args)?;
    let sup_cfg = choose_config(&device, args.sample_rate, args.channels)?;
    let sample_format = sup_cfg.sample_format();
    let mut cfg = sup_cfg.config();

    if let Some(sr) = args.sample_rate { cfg.sample_rate = cpal::SampleRate(sr); }
    if let Some(ch) = args.channels    { cfg.channels    = ch; }

    let sr = cfg.sample_rate.0;
    let engine = Granular::new(sr, &engine_config(args))?;
    let source = make_source(args, sr)?;

    log_selection(&device.name()?, &cfg, &sample_format, args);
    println!("Press Ctrl+C to stop…\n");

    let err_fn = |e: cpal::StreamError| log::error!("stream error: {e}");

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &cfg, engine, source, args.controls, err_fn)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &cfg, engine, source, args.controls, err_fn)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &cfg, engine, source, args.controls, err_fn)?,
        other => return Err(format!("unsupported device sample format: {other:?}").into()),
    };

    stream.play()?;

    if let Some(d) = args.duration_sec {
        std::thread::sleep(Duration::from_secs(d));
        return Ok(());
    }

    loop { std::thread::sleep(Duration::from_millis(500)); }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = parse_args();

    if let Some(seconds) = args.render_sec {
        return render_offline(&args, seconds);
    }

    run_device(&args)
}

#[cfg(feature = "realtime")]
fn run_device(args: &Args) -> Result<(), Box<dyn Error>> {
    if args.list_devices {
        return list_output_devices();
    }
    println!("tapgrain-cli: granular delay player\n");
    play_realtime(args)
}

#[cfg(not(feature = "realtime"))]
fn run_device(args: &Args) -> Result<(), Box<dyn Error>> {
    log::debug!("ignoring device options: {:?} {:?}", args.device_name, args.channels);
    Err("built without the `realtime` feature; use --render=SECONDS".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static RECORDS: Mutex<Vec<(log::Level, String)>> = Mutex::new(Vec::new());

    struct Capture;

    impl log::Log for Capture {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            RECORDS.lock().unwrap().push((record.level(), record.args().to_string()));
        }

        fn flush(&self) {}
    }

    #[test]
    fn selection_goes_to_the_log_at_info() {
        log::set_logger(&Capture).unwrap();
        log::set_max_level(log::LevelFilter::Info);

        let args = Args { source: Some("sine".into()), duration_sec: Some(3), ..Args::default() };
        log_selection("Test Device", &"48000 Hz, 2 ch", &"F32", &args);

        let records = RECORDS.lock().unwrap();
        let lines: Vec<&str> = records.iter().map(|(_, m)| m.as_str()).collect();
        assert!(records.iter().all(|(level, _)| *level == log::Level::Info));
        assert_eq!(lines[0], "using device: Test Device");
        assert!(lines[1].starts_with("stream config: \"48000 Hz, 2 ch\""));
        assert!(lines[2].starts_with("source: sine"));
        assert_eq!(lines[3], "auto-stop after 3 seconds");
    }

    #[test]
    fn render_block_stats() {
        let mut stats = ChannelStats::default();
        for x in [0.5_f32, -1.0, 0.5, 0.0] {
            stats.add(x);
        }
        assert_eq!(stats.peak, 1.0);
        assert!((stats.rms(4) - (1.5_f64 / 4.0).sqrt()).abs() < 1e-12);
        assert_eq!(ChannelStats::default().rms(0), 0.0);
    }
}
