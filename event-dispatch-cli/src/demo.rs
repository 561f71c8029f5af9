//! Guided walkthrough
//!
//! Prints a short tour of the dispatcher: free functions, closures, listener
//! methods, fire-once subscriptions and object-wide removal, all through an
//! owner that only lets outsiders subscribe.

use anyhow::Result;
use event_dispatch::{
    Dispatcher, ExecRule, FunctionId, Listener, RemoveMode, Subscriptions, TargetId,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Owner of two signals. Outsiders can subscribe, only the thermostat fires.
#[derive(Default)]
pub struct Thermostat {
    reading: f64,
    changed: Dispatcher<(f64, f64)>,
    reset: Dispatcher<()>,
}

impl Thermostat {
    pub fn on_changed(&mut self) -> Subscriptions<'_, (f64, f64)> {
        self.changed.subscriptions()
    }

    pub fn on_reset(&mut self) -> Subscriptions<'_, ()> {
        self.reset.subscriptions()
    }

    pub fn set(&mut self, reading: f64) {
        let previous = self.reading;
        self.reading = reading;
        self.changed.invoke(&(previous, reading));
    }

    pub fn reset(&mut self) {
        self.reading = 0.0;
        self.reset.invoke(&());
    }
}

/// A listener object with public handlers and one it registers itself
pub struct Readout {
    id: TargetId,
    label: &'static str,
    lines: Rc<RefCell<Vec<String>>>,
}

impl Listener for Readout {
    fn listener_id(&self) -> TargetId {
        self.id
    }
}

impl Readout {
    pub fn new(label: &'static str, lines: &Rc<RefCell<Vec<String>>>) -> Rc<Self> {
        Rc::new(Self {
            id: TargetId::next(),
            label,
            lines: Rc::clone(lines),
        })
    }

    fn emit(&self, line: String) {
        println!("  {}", line);
        self.lines.borrow_mut().push(line);
    }

    pub fn show(&self, change: &(f64, f64)) {
        self.emit(format!("{}: {:.1} -> {:.1}", self.label, change.0, change.1));
    }

    pub fn blank(&self, _: &()) {
        self.emit(format!("{}: cleared", self.label));
    }

    fn audit(&self, change: &(f64, f64)) {
        self.emit(format!("{} (audit): delta {:+.1}", self.label, change.1 - change.0));
    }

    /// Subscribe a handler outsiders cannot name
    pub fn attach_audit(self: &Rc<Self>, thermostat: &mut Thermostat) -> Result<()> {
        thermostat
            .on_changed()
            .add_method(self, Self::audit, ExecRule::Persistent)?;
        Ok(())
    }
}

fn banner(change: &(f64, f64)) {
    println!("  banner: reading is now {:.1}", change.1);
}

/// Run the walkthrough, returning every line the displays printed
pub fn run_demo() -> Result<Vec<String>> {
    println!("═══════════════════════════════════════════════");
    println!("  Event Dispatch - Demo");
    println!("═══════════════════════════════════════════════\n");

    let lines = Rc::new(RefCell::new(Vec::new()));
    let mut thermostat = Thermostat::default();
    let lobby = Readout::new("lobby", &lines);
    let office = Readout::new("office", &lines);

    println!("1. Free functions and closures, in registration order");
    {
        let mut subs = thermostat.on_changed();
        subs.add_fn(banner, ExecRule::Persistent);
        let counter = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&counter);
        subs.add_free(
            FunctionId::next(),
            move |_: &(f64, f64)| {
                *seen.borrow_mut() += 1;
                println!("  closure: change #{}", seen.borrow());
            },
            ExecRule::Persistent,
        )?;
    }
    thermostat.set(21.5);

    println!("\n2. Listener methods, including one registered privately");
    thermostat
        .on_changed()
        .add_method(&lobby, Readout::show, ExecRule::Persistent)?;
    thermostat
        .on_changed()
        .add_method(&office, Readout::show, ExecRule::Persistent)?;
    office.attach_audit(&mut thermostat)?;
    thermostat
        .on_reset()
        .add_method(&lobby, Readout::blank, ExecRule::TriggerOnce)?;
    thermostat.set(22.0);

    println!("\n3. Fire-once subscription on reset");
    thermostat.reset();
    thermostat.reset();
    println!("  (second reset reached no one)");

    println!("\n4. Removing the office display removes its private handler too");
    let removed = thermostat.on_changed().remove_object(office.listener_id())?;
    println!("  removed {} registrations", removed);
    thermostat.set(19.0);

    println!("\n5. Removing one function");
    thermostat.on_changed().remove_fn(banner, RemoveMode::RemoveOne);
    thermostat.set(20.0);

    println!("\n6. Invalid arguments are rejected");
    match thermostat.on_changed().remove_object(TargetId::NONE) {
        Ok(_) => println!("  unexpected success"),
        Err(e) => println!("  rejected: {}", e),
    }

    let stats = thermostat.on_changed().stats();
    println!(
        "\n📊 changed: {} live / {} slots / capacity {}",
        stats.live, stats.len, stats.capacity
    );

    let lines = lines.borrow().clone();
    Ok(lines)
}
