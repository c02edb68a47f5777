//! C ABI wrapper for the tapgrain granular unit.
//!
//! Mirrors the classic host callback table: instantiate an opaque handle,
//! connect a memory location to each port, run blocks, clean up. Descriptor
//! metadata (names, port kinds, range hints) is queryable without an instance.
//!
//! ABI notes
//! - All functions are `extern "C"` and `#[no_mangle]`.
//! - Opaque handle type: `TapgrainInstance` (heap-allocated; release it with
//!   `tapgrain_cleanup`).
//! - Audio ports point at `sample_count` floats during `tapgrain_run`; control
//!   ports point at a single float. Input and output buffers may alias.
//!
//! Threading
//! - An instance is NOT thread-safe; call `connect_port`/`run` for one instance
//!   from one thread at a time.

use std::ffi::{c_char, c_ulong, CStr};
use std::ptr;

use tapgrain_engine::plugin::{GranularPlugin, Plugin};
use tapgrain_engine::{GranularConfig, Port, PortKind, GRANULAR, PORT_COUNT};

/// Opaque instance we hand to C: the plugin plus the raw port bindings.
pub struct TapgrainInstance {
    plugin: GranularPlugin,
    ports: [*mut f32; PORT_COUNT],
}

/// Range hint for one port, LADSPA-compatible bit layout.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TapgrainPortHint {
    pub flags: u32,
    pub lower: f32,
    pub upper: f32,
}

// NUL-terminated copies of the descriptor strings, in port order.
static PORT_NAMES: [&CStr; PORT_COUNT] = [
    c"Left input",
    c"Right input",
    c"Left output",
    c"Right output",
    c"Min. delay",
    c"Max. delay",
    c"Min. length",
    c"Max. length",
    c"Min. cooldown",
    c"Max. cooldown",
    c"Min. gain",
    c"Max. gain",
    c"Slots",
    c"Master gain",
];

static LABEL: &CStr = c"audio";
static NAME: &CStr = c"Granular";
static MAKER: &CStr = c"Ludvig Gunne Lindström";
static COPYRIGHT: &CStr = c"None";

fn port_at(port: c_ulong) -> Option<Port> {
    usize::try_from(port).ok().and_then(Port::from_index)
}

// --- Descriptor metadata ---------------------------------------------------------

#[no_mangle]
pub extern "C" fn tapgrain_unique_id() -> u32 {
    GRANULAR.unique_id
}

#[no_mangle]
pub extern "C" fn tapgrain_label() -> *const c_char {
    LABEL.as_ptr()
}

#[no_mangle]
pub extern "C" fn tapgrain_name() -> *const c_char {
    NAME.as_ptr()
}

#[no_mangle]
pub extern "C" fn tapgrain_maker() -> *const c_char {
    MAKER.as_ptr()
}

#[no_mangle]
pub extern "C" fn tapgrain_copyright() -> *const c_char {
    COPYRIGHT.as_ptr()
}

#[no_mangle]
pub extern "C" fn tapgrain_port_count() -> c_ulong {
    PORT_COUNT as c_ulong
}

/// Port name, or null for an index past the port table.
#[no_mangle]
pub extern "C" fn tapgrain_port_name(port: c_ulong) -> *const c_char {
    match port_at(port) {
        Some(p) => PORT_NAMES[p.index()].as_ptr(),
        None => ptr::null(),
    }
}

/// Port descriptor bits (direction | kind), 0 for an unknown index.
#[no_mangle]
pub extern "C" fn tapgrain_port_descriptor(port: c_ulong) -> u32 {
    port_at(port).map_or(0, |p| p.kind().bits())
}

/// Write the range hint of `port` into `out`. Returns false for an unknown
/// index or a null `out`.
#[no_mangle]
pub extern "C" fn tapgrain_port_hint(port: c_ulong, out: *mut TapgrainPortHint) -> bool {
    let Some(p) = port_at(port) else { return false };
    if out.is_null() {
        return false;
    }
    let hint = p.descriptor().hint;
    unsafe {
        out.write(TapgrainPortHint { flags: hint.flags, lower: hint.lower, upper: hint.upper });
    }
    true
}

// --- Creation / destruction -------------------------------------------------------

fn instantiate(sample_rate: c_ulong, config: Option<GranularConfig>) -> *mut TapgrainInstance {
    let Ok(sr) = u32::try_from(sample_rate) else {
        log::error!("tapgrain: sample rate {sample_rate} out of range");
        return ptr::null_mut();
    };
    let plugin = match config {
        Some(config) => GranularPlugin::with_config(sr, &config),
        None => GranularPlugin::construct(sr),
    };
    match plugin {
        Ok(plugin) => Box::into_raw(Box::new(TapgrainInstance {
            plugin,
            ports: [ptr::null_mut(); PORT_COUNT],
        })),
        Err(err) => {
            log::error!("tapgrain: instantiation failed: {err}");
            ptr::null_mut()
        }
    }
}

/// Create an instance seeded from OS entropy.
/// Returns null on failure (zero/oversized sample rate, allocation failure).
#[no_mangle]
pub extern "C" fn tapgrain_instantiate(sample_rate: c_ulong) -> *mut TapgrainInstance {
    instantiate(sample_rate, None)
}

/// Create an instance with a fixed RNG seed, for reproducible renders.
#[no_mangle]
pub extern "C" fn tapgrain_instantiate_seeded(sample_rate: c_ulong, seed: u64) -> *mut TapgrainInstance {
    instantiate(sample_rate, Some(GranularConfig::default().with_seed(seed)))
}

/// Destroy an instance previously returned by `tapgrain_instantiate*`.
#[no_mangle]
pub extern "C" fn tapgrain_cleanup(instance: *mut TapgrainInstance) {
    if !instance.is_null() {
        unsafe { drop(Box::from_raw(instance)); }
    }
}

// --- Port binding / processing ----------------------------------------------------

/// Bind `data` to `port`. Unknown ports are ignored.
#[no_mangle]
pub extern "C" fn tapgrain_connect_port(instance: *mut TapgrainInstance, port: c_ulong, data: *mut f32) {
    if instance.is_null() {
        log::warn!("tapgrain: connect_port on a null instance");
        return;
    }
    let inst = unsafe { &mut *instance };
    match port_at(port) {
        Some(p) => inst.ports[p.index()] = data,
        None => log::warn!("tapgrain: connect_port on unknown port {port}"),
    }
}

/// Process `sample_count` frames through the bound ports.
///
/// Unbound control ports keep their previous value, unbound inputs read as
/// silence; if an output is unbound the block is skipped and the other output
/// is zero-filled.
#[no_mangle]
pub extern "C" fn tapgrain_run(instance: *mut TapgrainInstance, sample_count: c_ulong) {
    if instance.is_null() {
        return;
    }
    let inst = unsafe { &mut *instance };
    let Ok(frames) = usize::try_from(sample_count) else { return };

    for port in Port::ALL {
        let data = inst.ports[port.index()];
        if port.kind() == PortKind::Control && !data.is_null() {
            let value = unsafe { data.read() };
            inst.plugin.controls_mut().set(port, value);
        }
    }

    let in_l = inst.ports[Port::LeftInput.index()];
    let in_r = inst.ports[Port::RightInput.index()];
    let out_l = inst.ports[Port::LeftOutput.index()];
    let out_r = inst.ports[Port::RightOutput.index()];

    if out_l.is_null() || out_r.is_null() {
        for out in [out_l, out_r] {
            if !out.is_null() {
                unsafe { ptr::write_bytes(out, 0, frames) };
            }
        }
        return;
    }

    let controls = *inst.plugin.controls();
    let engine = inst.plugin.engine_mut();
    let params = engine.resolve(&controls);

    // Element-wise raw reads/writes: hosts may pass the same buffer for an
    // input and an output, so no slices are formed over them.
    let read = |buf: *mut f32, i: usize| if buf.is_null() { 0.0 } else { unsafe { buf.add(i).read() } };
    engine.process_with(
        frames,
        &params,
        |i| (read(in_l, i), read(in_r, i)),
        |i, (l, r)| unsafe {
            out_l.add(i).write(l);
            out_r.add(i).write(r);
        },
    );
}
