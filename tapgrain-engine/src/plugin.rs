//! Host-facing plugin adapter.
//!
//! Hosts drive a unit through four steps: construct it, bind a location to
//! each port, process a block, destroy it. In Rust the binding set is a
//! per-block [`Ports`] value borrowing the host's buffers, so nothing bound
//! can outlive the `process` call, and destruction is `Drop`.
//!
//! Unbound ports are tolerated:
//! - control ports keep their last value (initially the declared default);
//! - audio inputs read as silence;
//! - if either audio output is unbound the block is skipped and the bound one
//!   is zero-filled.

use crate::config::GranularConfig;
use crate::error::{EngineError, Result};
use crate::granular::Granular;
use crate::params::Controls;
use crate::ports::{Port, PortKind, PluginDescriptor, GRANULAR, PORT_COUNT};

/// A location bound to one port for the duration of one block.
#[derive(Debug)]
pub enum PortLocation<'a> {
    Control(f32),
    Input(&'a [f32]),
    Output(&'a mut [f32]),
}

impl PortLocation<'_> {
    fn kind_name(&self) -> &'static str {
        match self {
            PortLocation::Control(_) => "a control value",
            PortLocation::Input(_) => "an input buffer",
            PortLocation::Output(_) => "an output buffer",
        }
    }

    fn fits(&self, kind: PortKind) -> bool {
        matches!(
            (self, kind),
            (PortLocation::Control(_), PortKind::Control)
                | (PortLocation::Input(_), PortKind::AudioIn)
                | (PortLocation::Output(_), PortKind::AudioOut)
        )
    }
}

/// Port bindings for one block.
#[derive(Debug, Default)]
pub struct Ports<'a> {
    slots: [Option<PortLocation<'a>>; PORT_COUNT],
}

impl<'a> Ports<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `location` to `port`, replacing any earlier binding.
    pub fn bind(&mut self, port: Port, location: PortLocation<'a>) -> Result<()> {
        if !location.fits(port.kind()) {
            return Err(EngineError::PortMismatch {
                index: port.index(),
                name: port.name(),
                given: location.kind_name(),
            });
        }
        self.slots[port.index()] = Some(location);
        Ok(())
    }

    /// [`Ports::bind`] by raw port index.
    pub fn bind_index(&mut self, index: usize, location: PortLocation<'a>) -> Result<()> {
        let port = Port::from_index(index).ok_or(EngineError::UnknownPort(index))?;
        self.bind(port, location)
    }

    /// Builder form of [`Ports::bind`].
    pub fn with(mut self, port: Port, location: PortLocation<'a>) -> Result<Self> {
        self.bind(port, location)?;
        Ok(self)
    }

    fn control(&self, port: Port) -> Option<f32> {
        match self.slots[port.index()] {
            Some(PortLocation::Control(v)) => Some(v),
            _ => None,
        }
    }
}

/// The four-step host contract.
pub trait Plugin: Sized {
    /// Static metadata.
    fn descriptor() -> &'static PluginDescriptor;

    /// Allocate everything the unit will ever need.
    fn construct(sample_rate: u32) -> Result<Self>;

    /// Consume one block of bound ports, `sample_count` frames long.
    fn process(&mut self, ports: &mut Ports<'_>, sample_count: usize);
}

/// The granular engine behind the [`Plugin`] contract.
#[derive(Debug)]
pub struct GranularPlugin {
    engine: Granular,
    controls: Controls,
}

impl GranularPlugin {
    pub fn with_config(sample_rate: u32, config: &GranularConfig) -> Result<Self> {
        Ok(Self { engine: Granular::new(sample_rate, config)?, controls: Controls::default() })
    }

    #[inline] pub fn engine(&self) -> &Granular { &self.engine }
    #[inline] pub fn engine_mut(&mut self) -> &mut Granular { &mut self.engine }
    #[inline] pub fn controls(&self) -> &Controls { &self.controls }
    #[inline] pub fn controls_mut(&mut self) -> &mut Controls { &mut self.controls }
}

impl Plugin for GranularPlugin {
    fn descriptor() -> &'static PluginDescriptor {
        &GRANULAR
    }

    fn construct(sample_rate: u32) -> Result<Self> {
        Self::with_config(sample_rate, &GranularConfig::default())
    }

    fn process(&mut self, ports: &mut Ports<'_>, sample_count: usize) {
        for port in Port::ALL {
            if let Some(v) = ports.control(port) {
                self.controls.set(port, v);
            }
        }
        let params = self.engine.resolve(&self.controls);

        let (inputs, rest) = ports.slots.split_at_mut(Port::LeftOutput.index());
        let in_l = bound_input(&inputs[Port::LeftInput.index()]);
        let in_r = bound_input(&inputs[Port::RightInput.index()]);
        match rest {
            [Some(PortLocation::Output(out_l)), Some(PortLocation::Output(out_r)), ..] => {
                let n = sample_count.min(out_l.len()).min(out_r.len());
                self.engine.process([in_l, in_r], [&mut out_l[..n], &mut out_r[..n]], &params);
            }
            [out_l, out_r, ..] => {
                zero_fill(out_l, sample_count);
                zero_fill(out_r, sample_count);
            }
            _ => {}
        }
    }
}

fn bound_input<'s>(slot: &'s Option<PortLocation<'_>>) -> &'s [f32] {
    match slot {
        Some(PortLocation::Input(buf)) => buf,
        _ => &[],
    }
}

fn zero_fill(slot: &mut Option<PortLocation<'_>>, sample_count: usize) {
    if let Some(PortLocation::Output(buf)) = slot {
        let n = sample_count.min(buf.len());
        buf[..n].fill(0.0);
    }
}
