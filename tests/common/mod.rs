#![allow(dead_code)]

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Result};
use framecore::{
    pacing::FramePacer, EntityId, FrameContext, Game, LoopConfig, System,
};

/// Pacer that reports a fixed, adjustable delta and never waits.
pub struct ManualPacer {
    pub delta: Rc<Cell<Duration>>,
    pub resets: Rc<Cell<u32>>,
    pub targets: Rc<RefCell<Vec<Option<Duration>>>>,
}

pub struct PacerControl {
    pub delta: Rc<Cell<Duration>>,
    pub resets: Rc<Cell<u32>>,
    pub targets: Rc<RefCell<Vec<Option<Duration>>>>,
}

impl FramePacer for ManualPacer {
    fn wait_for_next_frame(&mut self, target: Option<Duration>) -> Duration {
        self.targets.borrow_mut().push(target);
        self.delta.get()
    }

    fn reset(&mut self) {
        self.resets.set(self.resets.get() + 1);
    }
}

pub fn manual_game(delta: Duration) -> (Game, PacerControl) {
    let control = PacerControl {
        delta: Rc::new(Cell::new(delta)),
        resets: Rc::new(Cell::new(0)),
        targets: Rc::new(RefCell::new(Vec::new())),
    };
    let pacer = ManualPacer {
        delta: Rc::clone(&control.delta),
        resets: Rc::clone(&control.resets),
        targets: Rc::clone(&control.targets),
    };
    let game = Game::with_pacer(&LoopConfig::default(), Box::new(pacer)).expect("valid config");
    (game, control)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub system: &'static str,
    pub frame: u64,
    pub delta: f32,
    pub live: Vec<EntityId>,
}

pub type Journal = Rc<RefCell<Vec<Observation>>>;

/// Records every update it receives, together with the live set it saw.
pub struct Recorder {
    pub label: &'static str,
    pub journal: Journal,
    pub scene_loads: Rc<Cell<u32>>,
}

impl Recorder {
    pub fn new(label: &'static str, journal: &Journal) -> Self {
        Self {
            label,
            journal: Rc::clone(journal),
            scene_loads: Rc::new(Cell::new(0)),
        }
    }
}

impl System for Recorder {
    fn name(&self) -> &str {
        self.label
    }

    fn update(&mut self, ctx: &FrameContext<'_>, delta_seconds: f32) -> Result<()> {
        let live = ctx
            .entities()
            .live_entities()
            .iter()
            .map(|entity| entity.id())
            .collect();
        self.journal.borrow_mut().push(Observation {
            system: self.label,
            frame: ctx.frame(),
            delta: delta_seconds,
            live,
        });
        Ok(())
    }

    fn on_new_scene_loaded(&mut self) -> Result<()> {
        self.scene_loads.set(self.scene_loads.get() + 1);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Fails on a chosen frame.
pub struct Failing {
    pub on_frame: u64,
}

impl System for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn update(&mut self, ctx: &FrameContext<'_>, _delta_seconds: f32) -> Result<()> {
        if ctx.frame() == self.on_frame {
            bail!("broken on frame {}", ctx.frame());
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Runs an arbitrary closure on each update.
pub struct Scripted<F>
where
    F: FnMut(&FrameContext<'_>) -> Result<()> + 'static,
{
    pub label: &'static str,
    pub script: F,
}

impl<F> System for Scripted<F>
where
    F: FnMut(&FrameContext<'_>) -> Result<()> + 'static,
{
    fn name(&self) -> &str {
        self.label
    }

    fn update(&mut self, ctx: &FrameContext<'_>, _delta_seconds: f32) -> Result<()> {
        (self.script)(ctx)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub fn observations_for(journal: &Journal, system: &str) -> Vec<Observation> {
    journal
        .borrow()
        .iter()
        .filter(|observation| observation.system == system)
        .cloned()
        .collect()
}

/// Distinct registry kinds so several recorders can be registered side by side.
pub struct KindA;
pub struct KindB;
pub struct KindC;

pub fn scripted<F>(label: &'static str, script: F) -> Scripted<F>
where
    F: FnMut(&FrameContext<'_>) -> Result<()> + 'static,
{
    Scripted { label, script }
}
