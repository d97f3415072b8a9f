//! Communication instruction contract (spec.md §6.3): `send`/`receive` ladder instructions
//! with status tags and a strict `IDLE -> PENDING -> TERMINAL` lifecycle, driven by a
//! `CommTransport` the caller supplies. No real Modbus/TCP implementation lives here --
//! only the state machine and register-mapping contract spec.md names.

use crate::register::RegisterValue;
use ladder_context::{MemoryValue, ScanContext};
use ladder_instr::{InstrError, InstrOperand, Instruction, SourceLocation};
use ladder_types::{BlockRange, Value};
use std::sync::Arc;

/// Modbus-style function codes from the enumerated set spec.md §6.3 names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCode {
    ReadCoils = 1,
    ReadDiscreteInputs = 2,
    ReadHoldingRegisters = 3,
    ReadInputRegisters = 4,
    WriteSingleCoil = 5,
    WriteSingleRegister = 6,
    WriteMultipleCoils = 15,
    WriteMultipleRegisters = 16,
}

impl FunctionCode {
    /// `true` for function codes that write to the remote device (spec.md §6.3's `send`
    /// direction); `false` for reads (`receive`).
    pub fn is_write(self) -> bool {
        matches!(
            self,
            FunctionCode::WriteSingleCoil
                | FunctionCode::WriteSingleRegister
                | FunctionCode::WriteMultipleCoils
                | FunctionCode::WriteMultipleRegisters
        )
    }
}

/// Target endpoint for a communication instruction (spec.md §6.3).
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub host: Arc<str>,
    pub port: u16,
    pub device_id: u8,
}

impl Endpoint {
    pub fn new(host: impl Into<Arc<str>>, port: u16, device_id: u8) -> Self {
        Endpoint {
            host: host.into(),
            port,
            device_id,
        }
    }
}

/// The request a `CommTransport` is asked to service: a logical or raw address, a function
/// code, and an optional element count (spec.md §6.3).
#[derive(Debug, Clone, PartialEq)]
pub struct CommRequest {
    pub endpoint: Endpoint,
    pub function: FunctionCode,
    pub address: u16,
    pub count: Option<u16>,
    pub write_values: Vec<RegisterValue>,
}

/// The outcome of one poll of an in-flight request (spec.md §6.3).
#[derive(Debug, Clone, PartialEq)]
pub enum CommPoll {
    Pending,
    Success(Vec<RegisterValue>),
    /// The remote device returned a Modbus-style exception response carrying this code.
    ProtocolException(u8),
    /// Transport/timeout failure: `exception_response` is set to 0 (spec.md §6.3).
    TransportError,
}

/// Caller-supplied driver for the wire protocol. A real implementation talks to an actual
/// Modbus/TCP device; tests and simulations supply a fake.
pub trait CommTransport {
    /// Starts (or re-polls, if already in flight) `request`. Implementations that cannot
    /// complete synchronously return `CommPoll::Pending` and expect subsequent `poll` calls
    /// once per scan until a terminal outcome is reached.
    fn poll(&mut self, request: &CommRequest) -> CommPoll;

    /// Cancels an in-flight request because rung power dropped to false while `PENDING`
    /// (spec.md §6.3). Default no-op is correct for transports with no cancellable
    /// in-flight state to tear down.
    fn cancel(&mut self, _request: &CommRequest) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommState {
    Idle,
    Pending,
    Terminal,
}

impl CommState {
    fn as_str(self) -> &'static str {
        match self {
            CommState::Idle => "idle",
            CommState::Pending => "pending",
            CommState::Terminal => "terminal",
        }
    }

    fn parse(s: &str) -> CommState {
        match s {
            "pending" => CommState::Pending,
            "terminal" => CommState::Terminal,
            _ => CommState::Idle,
        }
    }
}

/// Status tags a communication instruction exposes (spec.md §6.3: "status tags
/// `sending/receiving`, `success`, `error`, `exception_response`").
#[derive(Debug, Clone)]
pub struct CommStatus {
    pub active: Arc<str>,
    pub success: Arc<str>,
    pub error: Arc<str>,
    pub exception_response: Arc<str>,
}

impl CommStatus {
    pub fn new(
        active: impl Into<Arc<str>>,
        success: impl Into<Arc<str>>,
        error: impl Into<Arc<str>>,
        exception_response: impl Into<Arc<str>>,
    ) -> Self {
        CommStatus {
            active: active.into(),
            success: success.into(),
            error: error.into(),
            exception_response: exception_response.into(),
        }
    }

    fn clear(&self, ctx: &mut ScanContext<'_>) -> Result<(), InstrError> {
        ctx.set_tag(&self.active, Value::Bool(false))?;
        ctx.set_tag(&self.success, Value::Bool(false))?;
        ctx.set_tag(&self.error, Value::Bool(false))?;
        ctx.set_tag(&self.exception_response, Value::Word(0))?;
        Ok(())
    }
}

/// `send`/`receive` (and addressed variants): always-execute so it can observe rung power
/// dropping to false mid-flight (spec.md §6.3, §5). The local operand is a block range of
/// tags to read from (`send`) or write into (`receive`), mapped coil-to-bool,
/// register-to-unsigned-16-bit-word.
pub struct CommInstruction<T: CommTransport> {
    request: CommRequest,
    local: BlockRange,
    status: CommStatus,
    loc: SourceLocation,
    transport: std::cell::RefCell<T>,
}

impl<T: CommTransport> CommInstruction<T> {
    pub fn new(
        request: CommRequest,
        local: BlockRange,
        status: CommStatus,
        loc: SourceLocation,
        transport: T,
    ) -> Self {
        CommInstruction {
            request,
            local,
            status,
            loc,
            transport: std::cell::RefCell::new(transport),
        }
    }

    fn state_key(&self) -> String {
        format!("_comm:{}:state", self.loc.as_str())
    }

    fn read_state(&self, ctx: &ScanContext<'_>) -> CommState {
        match ctx.get_memory(&self.state_key(), MemoryValue::Text("idle".to_string())) {
            MemoryValue::Text(s) => CommState::parse(&s),
            _ => CommState::Idle,
        }
    }

    fn write_state(&self, ctx: &mut ScanContext<'_>, state: CommState) {
        ctx.set_memory(&self.state_key(), MemoryValue::Text(state.as_str().to_string()));
    }

    fn apply_read_values(&self, ctx: &mut ScanContext<'_>, values: &[RegisterValue]) -> Result<(), InstrError> {
        for (tag, value) in self.local.tags().iter().zip(values.iter()) {
            ctx.set_tag(tag.name(), value.to_value(tag.ty()))?;
        }
        Ok(())
    }

    fn request_with_write_values(&self, ctx: &ScanContext<'_>) -> CommRequest {
        let mut request = self.request.clone();
        if self.request.function.is_write() {
            request.write_values = self
                .local
                .tags()
                .iter()
                .map(|t| RegisterValue::from_value(ctx.get_tag(t.name(), t.default())))
                .collect();
        }
        request
    }
}

impl<T: CommTransport> Instruction for CommInstruction<T> {
    fn always_execute(&self) -> bool {
        true
    }

    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        let state = self.read_state(ctx);

        if !enabled {
            if state == CommState::Pending {
                self.transport.borrow_mut().cancel(&self.request);
            }
            self.status.clear(ctx)?;
            self.write_state(ctx, CommState::Idle);
            return Ok(());
        }

        match state {
            CommState::Idle | CommState::Pending => {
                ctx.set_tag(&self.status.active, Value::Bool(true))?;
                let request = self.request_with_write_values(ctx);
                let outcome = self.transport.borrow_mut().poll(&request);
                match outcome {
                    CommPoll::Pending => {
                        self.write_state(ctx, CommState::Pending);
                    }
                    CommPoll::Success(values) => {
                        if !self.request.function.is_write() {
                            self.apply_read_values(ctx, &values)?;
                        }
                        ctx.set_tag(&self.status.active, Value::Bool(false))?;
                        ctx.set_tag(&self.status.success, Value::Bool(true))?;
                        ctx.set_tag(&self.status.error, Value::Bool(false))?;
                        ctx.set_tag(&self.status.exception_response, Value::Word(0))?;
                        self.write_state(ctx, CommState::Terminal);
                    }
                    CommPoll::ProtocolException(code) => {
                        ctx.set_tag(&self.status.active, Value::Bool(false))?;
                        ctx.set_tag(&self.status.success, Value::Bool(false))?;
                        ctx.set_tag(&self.status.error, Value::Bool(true))?;
                        ctx.set_tag(&self.status.exception_response, Value::Word(code as u16))?;
                        self.write_state(ctx, CommState::Terminal);
                    }
                    CommPoll::TransportError => {
                        ctx.set_tag(&self.status.active, Value::Bool(false))?;
                        ctx.set_tag(&self.status.success, Value::Bool(false))?;
                        ctx.set_tag(&self.status.error, Value::Bool(true))?;
                        ctx.set_tag(&self.status.exception_response, Value::Word(0))?;
                        self.write_state(ctx, CommState::Terminal);
                    }
                }
            }
            CommState::Terminal => {
                // Hold the terminal status until rung power drops and the instruction
                // re-arms (spec.md §6.3).
            }
        }
        Ok(())
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![InstrOperand::BlockRange("local".into(), self.local.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_context::{NoRestrictions, SystemState};
    use ladder_types::{Block, TagType};
    use std::collections::BTreeMap;

    struct ScriptedTransport {
        outcomes: Vec<CommPoll>,
        cancelled: bool,
    }

    impl CommTransport for ScriptedTransport {
        fn poll(&mut self, _request: &CommRequest) -> CommPoll {
            if self.outcomes.len() > 1 {
                self.outcomes.remove(0)
            } else {
                self.outcomes[0].clone()
            }
        }
        fn cancel(&mut self, _request: &CommRequest) {
            self.cancelled = true;
        }
    }

    fn request() -> CommRequest {
        CommRequest {
            endpoint: Endpoint::new("10.0.0.5", 502, 1),
            function: FunctionCode::ReadHoldingRegisters,
            address: 0,
            count: Some(2),
            write_values: Vec::new(),
        }
    }

    fn local_range() -> BlockRange {
        Block::new("DS", TagType::Word, 1, 2).select_all()
    }

    fn status() -> CommStatus {
        CommStatus::new("Active", "Success", "Error", "ExcCode")
    }

    fn blank_state() -> SystemState {
        let mut tags = BTreeMap::new();
        tags.insert("DS1".to_string(), Value::Word(0));
        tags.insert("DS2".to_string(), Value::Word(0));
        tags.insert("Active".to_string(), Value::Bool(false));
        tags.insert("Success".to_string(), Value::Bool(false));
        tags.insert("Error".to_string(), Value::Bool(false));
        tags.insert("ExcCode".to_string(), Value::Word(0));
        SystemState::initial(tags)
    }

    #[test]
    fn success_applies_register_values_and_sets_terminal_status() {
        let transport = ScriptedTransport {
            outcomes: vec![CommPoll::Success(vec![
                RegisterValue::Word(11),
                RegisterValue::Word(22),
            ])],
            cancelled: false,
        };
        let comm = CommInstruction::new(
            request(),
            local_range(),
            status(),
            SourceLocation::new("r0.i0"),
            transport,
        );
        let s0 = blank_state();
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        comm.execute(&mut ctx, true).unwrap();
        assert_eq!(ctx.get_tag("DS1", Value::Word(0)), Value::Word(11));
        assert_eq!(ctx.get_tag("DS2", Value::Word(0)), Value::Word(22));
        assert_eq!(ctx.get_tag("Success", Value::Bool(false)), Value::Bool(true));
        assert_eq!(ctx.get_tag("Active", Value::Bool(true)), Value::Bool(false));
    }

    #[test]
    fn rung_false_while_pending_cancels_and_clears_status() {
        let transport = ScriptedTransport {
            outcomes: vec![CommPoll::Pending],
            cancelled: false,
        };
        let comm = CommInstruction::new(
            request(),
            local_range(),
            status(),
            SourceLocation::new("r0.i0"),
            transport,
        );
        let s0 = blank_state();
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        comm.execute(&mut ctx, true).unwrap();
        assert_eq!(ctx.get_tag("Active", Value::Bool(false)), Value::Bool(true));

        comm.execute(&mut ctx, false).unwrap();
        assert!(comm.transport.borrow().cancelled);
        assert_eq!(ctx.get_tag("Active", Value::Bool(true)), Value::Bool(false));
        assert_eq!(ctx.get_tag("Success", Value::Bool(true)), Value::Bool(false));
    }

    #[test]
    fn transport_error_sets_exception_response_to_zero() {
        let transport = ScriptedTransport {
            outcomes: vec![CommPoll::TransportError],
            cancelled: false,
        };
        let comm = CommInstruction::new(
            request(),
            local_range(),
            status(),
            SourceLocation::new("r0.i0"),
            transport,
        );
        let s0 = blank_state();
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        comm.execute(&mut ctx, true).unwrap();
        assert_eq!(ctx.get_tag("Error", Value::Bool(false)), Value::Bool(true));
        assert_eq!(ctx.get_tag("ExcCode", Value::Word(1)), Value::Word(0));
    }

    #[test]
    fn protocol_exception_carries_received_code() {
        let transport = ScriptedTransport {
            outcomes: vec![CommPoll::ProtocolException(4)],
            cancelled: false,
        };
        let comm = CommInstruction::new(
            request(),
            local_range(),
            status(),
            SourceLocation::new("r0.i0"),
            transport,
        );
        let s0 = blank_state();
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        comm.execute(&mut ctx, true).unwrap();
        assert_eq!(ctx.get_tag("ExcCode", Value::Word(0)), Value::Word(4));
    }
}
