/// Observer invoked with `(port, value)` on every access.
pub type PortHook = Box<dyn FnMut(u8, u8)>;

/// The 256-entry port space reached by `IN` and `OUT`.
pub struct Ports {
  values: [u8; 256],
  read_hook: Option<PortHook>,
  write_hook: Option<PortHook>,
}

impl Ports {
  pub fn new() -> Ports {
    Ports {
      values: [0; 256],
      read_hook: None,
      write_hook: None,
    }
  }

  pub fn on_read(&mut self, hook: PortHook) {
    self.read_hook = Some(hook);
  }

  pub fn on_write(&mut self, hook: PortHook) {
    self.write_hook = Some(hook);
  }

  pub fn read(&mut self, port: u8) -> u8 {
    let value = self.values[usize::from(port)];
    if let Some(hook) = self.read_hook.as_mut() {
      hook(port, value);
    }
    value
  }

  pub fn write(&mut self, port: u8, value: u8) {
    self.values[usize::from(port)] = value;
    if let Some(hook) = self.write_hook.as_mut() {
      hook(port, value);
    }
  }

  /// Set the value a device presents on `port` without notifying observers.
  pub fn poke(&mut self, port: u8, value: u8) {
    self.values[usize::from(port)] = value;
  }
}
