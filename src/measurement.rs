use std::fmt;

use crate::{
    proto::DecodeError,
    rawmea::{RawDisplay, RawInfo},
};

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub model: String,
    pub serial: String,
    pub model_id: u16,
    pub firmware: f64,
}

impl From<RawInfo> for DeviceInfo {
    fn from(value: RawInfo) -> Self {
        Self {
            model: value.model,
            serial: value.serial,
            model_id: value.model_id,
            firmware: f64::from(value.firmware) / 100.0,
        }
    }
}

/// Measuring function, codes 0x00 to 0x31.
///
/// The codes 0x32 to 0x3E are rarely used special modes and not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
#[repr(u8)]
pub enum Function {
    NONE = 0x00,
    V_AC,
    V_DC,
    MV_AC,
    MV_DC,
    OHMS,
    CONTINUITY,
    DIODE_TEST,
    CAPACITANCE,
    A_AC,
    A_DC,
    MA_AC,
    MA_DC,
    TEMPERATURE_C,
    TEMPERATURE_F,
    FREQUENCY,
    DUTY,
    HZ_V,
    HZ_MV,
    HZ_A,
    HZ_MA,
    V_AC_PLUS_DC,
    MV_AC_PLUS_DC,
    A_AC_PLUS_DC,
    MA_AC_PLUS_DC,
    V_LPF,
    MV_LPF,
    A_LPF,
    MA_LPF,
    UA_AC,
    UA_DC,
    A_DC_OUT,
    A_DC_OUT_SLOW_LINEAR,
    A_DC_OUT_FAST_LINEAR,
    A_DC_OUT_SLOW_STEP,
    A_DC_OUT_FAST_STEP,
    LOOP_POWER,
    HART_250_OHMS,
    VOLTAGE_SENSE,
    V_PEAK_HOLD,
    MV_PEAK_HOLD,
    A_PEAK_HOLD,
    MA_PEAK_HOLD,
    V_AC_LOZ,
    V_DC_LOZ,
    V_AC_PLUS_DC_LOZ,
    V_LPF_LOZ,
    HZ_V_LOZ,
    V_PEAK_HOLD_LOZ,
    BATTERY = 0x31,
}

/// Static description of a measuring function.
#[derive(Debug)]
pub struct FunctionInfo {
    pub function: Function,
    pub name: &'static str,
    pub unit: &'static str,
    pub family: Option<RangeFamily>,
}

macro_rules! func {
    ($f:ident, $name:expr, $unit:expr, $family:expr) => {
        FunctionInfo {
            function: Function::$f,
            name: $name,
            unit: $unit,
            family: $family,
        }
    };
}

use self::RangeFamily as R;

/// Indexed by function code.
pub static FUNCTIONS: [FunctionInfo; 0x32] = [
    func!(NONE, "None", "None", Some(R::None)),
    func!(V_AC, "AC V", "V", Some(R::Voltage)),
    func!(V_DC, "DC V", "V", Some(R::Voltage)),
    func!(MV_AC, "AC mV", "mV", Some(R::Millivolt)),
    func!(MV_DC, "DC mV", "mV", Some(R::Millivolt)),
    func!(OHMS, "Ohm", "Ohm", Some(R::Resistance)),
    func!(CONTINUITY, "Continuity", "Ohm", Some(R::Continuity)),
    func!(DIODE_TEST, "Diode", "V", Some(R::Diode)),
    func!(CAPACITANCE, "Capacitor", "uF", Some(R::Capacitance)),
    func!(A_AC, "AC A", "A", Some(R::Current)),
    func!(A_DC, "DC A", "A", Some(R::Current)),
    func!(MA_AC, "AC mA", "mA", Some(R::Millicurrent)),
    func!(MA_DC, "DC mA", "mA", Some(R::Millicurrent)),
    func!(TEMPERATURE_C, "°C", "°C", Some(R::Temperature)),
    func!(TEMPERATURE_F, "°F", "°F", Some(R::Temperature)),
    func!(FREQUENCY, "Frequency", "Hz", None),
    func!(DUTY, "Duty", "sec", None),
    func!(HZ_V, "Hz (V)", "Hz", Some(R::Frequency)),
    func!(HZ_MV, "Hz (mV)", "Hz", Some(R::Frequency)),
    func!(HZ_A, "Hz (A)", "Hz", Some(R::Frequency)),
    func!(HZ_MA, "Hz (mA)", "Hz", Some(R::Frequency)),
    func!(V_AC_PLUS_DC, "AC+DC (V)", "V", Some(R::Voltage)),
    func!(MV_AC_PLUS_DC, "AC+DC (mV)", "mV", Some(R::Millivolt)),
    func!(A_AC_PLUS_DC, "AC+DC (A)", "A", Some(R::Current)),
    func!(MA_AC_PLUS_DC, "AC+DC (mA)", "mA", Some(R::Millicurrent)),
    func!(V_LPF, "LPF (V)", "V", Some(R::Voltage)),
    func!(MV_LPF, "LPF (mV)", "mV", Some(R::Millivolt)),
    func!(A_LPF, "LPF (A)", "A", Some(R::Current)),
    func!(MA_LPF, "LPF (mA)", "mA", Some(R::Millicurrent)),
    func!(UA_AC, "AC uA", "uA", None),
    func!(UA_DC, "DC uA", "uA", None),
    func!(A_DC_OUT, "DC A out", "A", None),
    func!(A_DC_OUT_SLOW_LINEAR, "DC A out (Slow Linear)", "A", None),
    func!(A_DC_OUT_FAST_LINEAR, "DC A out (Fast Linear)", "A", None),
    func!(A_DC_OUT_SLOW_STEP, "DC A out (Slow Step)", "A", None),
    func!(A_DC_OUT_FAST_STEP, "DC A out (Fast Step)", "A", None),
    func!(LOOP_POWER, "Loop Power", "W", None),
    func!(HART_250_OHMS, "250 Ohm HART", "Ohm", None),
    func!(VOLTAGE_SENSE, "Voltage Sense", "V", None),
    func!(V_PEAK_HOLD, "Peak Hold (V)", "V", Some(R::Voltage)),
    func!(MV_PEAK_HOLD, "Peak Hold (mV)", "mV", Some(R::Millivolt)),
    func!(A_PEAK_HOLD, "Peak Hold (A)", "A", Some(R::Current)),
    func!(MA_PEAK_HOLD, "Peak Hold (mA)", "mA", Some(R::Millicurrent)),
    func!(V_AC_LOZ, "LoZ AC V", "V", Some(R::LowImpedanceVoltage)),
    func!(V_DC_LOZ, "LoZ DC V", "V", Some(R::LowImpedanceVoltage)),
    func!(V_AC_PLUS_DC_LOZ, "LoZ AC+DC (V)", "V", None),
    func!(V_LPF_LOZ, "LoZ LPF (V)", "V", None),
    func!(HZ_V_LOZ, "LoZ Hz (V)", "V", None),
    func!(V_PEAK_HOLD_LOZ, "LoZ Peak Hold (V)", "V", None),
    func!(BATTERY, "Battery", "%", None),
];

impl Function {
    pub fn info(&self) -> &'static FunctionInfo {
        &FUNCTIONS[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        self.info().name
    }

    /// Unit of a value scaled by the range multiplier.
    pub fn base_unit(&self) -> &'static str {
        self.info().unit
    }

    pub fn range_family(&self) -> Option<RangeFamily> {
        self.info().family
    }

    /// Decimal exponent of the multiplier for the given range code (auto flag removed).
    pub fn range_exponent(&self, range: u8) -> Result<i32, DecodeError> {
        self.range_family()
            .and_then(|family| family.exponent(range))
            .ok_or(DecodeError::UnknownRangeCode {
                function: *self as u8,
                range,
            })
    }
}

impl TryFrom<u8> for Function {
    type Error = DecodeError;

    /// Expects the code without the auto flag.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        FUNCTIONS
            .get(value as usize)
            .map(|info| info.function)
            .ok_or(DecodeError::UnknownFunctionCode(value))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Group of functions sharing one table of range multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeFamily {
    Resistance,
    Temperature,
    Voltage,
    Millivolt,
    LowImpedanceVoltage,
    Current,
    Millicurrent,
    Capacitance,
    Frequency,
    Continuity,
    Diode,
    None,
}

// (range code, decimal exponent of the multiplier)
static RANGE_RESISTANCE: [(u8, i32); 6] = [(0, -2), (1, -1), (2, 0), (3, 1), (4, 2), (5, 3)];
static RANGE_TEMPERATURE: [(u8, i32); 1] = [(0, -1)];
static RANGE_VOLTAGE: [(u8, i32); 4] = [(0, -4), (1, -3), (2, -2), (3, -1)];
static RANGE_MILLIVOLT: [(u8, i32); 2] = [(0, -3), (1, -2)];
// The firmware really starts these at code 2.
static RANGE_LOZ_VOLTAGE: [(u8, i32); 2] = [(2, -2), (3, -1)];
static RANGE_CURRENT: [(u8, i32); 2] = [(2, -4), (3, -3)];
static RANGE_MILLICURRENT: [(u8, i32); 2] = [(0, -3), (1, -2)];
static RANGE_CAPACITANCE: [(u8, i32); 7] = [
    (0, -5),
    (1, -4),
    (2, -3),
    (3, -2),
    (4, -1),
    (5, 0),
    (6, 1),
];
static RANGE_FREQUENCY: [(u8, i32); 4] = [(0, -2), (1, -1), (2, 0), (3, 1)];
static RANGE_CONTINUITY: [(u8, i32); 1] = [(0, -2)];
static RANGE_DIODE: [(u8, i32); 1] = [(0, -3)];
static RANGE_NONE: [(u8, i32); 1] = [(0, 0)];

impl RangeFamily {
    pub fn table(&self) -> &'static [(u8, i32)] {
        match self {
            RangeFamily::Resistance => &RANGE_RESISTANCE,
            RangeFamily::Temperature => &RANGE_TEMPERATURE,
            RangeFamily::Voltage => &RANGE_VOLTAGE,
            RangeFamily::Millivolt => &RANGE_MILLIVOLT,
            RangeFamily::LowImpedanceVoltage => &RANGE_LOZ_VOLTAGE,
            RangeFamily::Current => &RANGE_CURRENT,
            RangeFamily::Millicurrent => &RANGE_MILLICURRENT,
            RangeFamily::Capacitance => &RANGE_CAPACITANCE,
            RangeFamily::Frequency => &RANGE_FREQUENCY,
            RangeFamily::Continuity => &RANGE_CONTINUITY,
            RangeFamily::Diode => &RANGE_DIODE,
            RangeFamily::None => &RANGE_NONE,
        }
    }

    pub fn exponent(&self, range: u8) -> Option<i32> {
        self.table()
            .iter()
            .find(|(code, _)| *code == range)
            .map(|(_, exp)| *exp)
    }

    pub fn multiplier(&self, range: u8) -> Option<f64> {
        self.exponent(range).map(|exp| 10_f64.powi(exp))
    }
}

/// Unit encoded in bits 7..3 of the scope byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
#[repr(u8)]
pub enum ScopeUnit {
    None = 0x00,
    Volt,
    MilliVolt,
    Ampere,
    MilliAmpere,
    dB,
    dBm,
    MilliFarad,
    MicroFarad,
    NanoFarad,
    GigaOhm,
    MegaOhm,
    KiloOhm,
    Ohm,
    Percent,
    MegaHertz,
    KiloHertz,
    Hertz,
    Celsius,
    Fahrenheit,
    Seconds,
    MilliSeconds,
    MicroSeconds,
    NanoSeconds,
    MicroAmpere,
    Minutes,
    KiloWatt,
    PowerFactor = 0x1B,
}

static SCOPE_UNITS: [ScopeUnit; 28] = [
    ScopeUnit::None,
    ScopeUnit::Volt,
    ScopeUnit::MilliVolt,
    ScopeUnit::Ampere,
    ScopeUnit::MilliAmpere,
    ScopeUnit::dB,
    ScopeUnit::dBm,
    ScopeUnit::MilliFarad,
    ScopeUnit::MicroFarad,
    ScopeUnit::NanoFarad,
    ScopeUnit::GigaOhm,
    ScopeUnit::MegaOhm,
    ScopeUnit::KiloOhm,
    ScopeUnit::Ohm,
    ScopeUnit::Percent,
    ScopeUnit::MegaHertz,
    ScopeUnit::KiloHertz,
    ScopeUnit::Hertz,
    ScopeUnit::Celsius,
    ScopeUnit::Fahrenheit,
    ScopeUnit::Seconds,
    ScopeUnit::MilliSeconds,
    ScopeUnit::MicroSeconds,
    ScopeUnit::NanoSeconds,
    ScopeUnit::MicroAmpere,
    ScopeUnit::Minutes,
    ScopeUnit::KiloWatt,
    ScopeUnit::PowerFactor,
];

impl ScopeUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            ScopeUnit::None => "None",
            ScopeUnit::Volt => "V",
            ScopeUnit::MilliVolt => "mV",
            ScopeUnit::Ampere => "A",
            ScopeUnit::MilliAmpere => "mA",
            ScopeUnit::dB => "dB",
            ScopeUnit::dBm => "dBm",
            ScopeUnit::MilliFarad => "mF",
            ScopeUnit::MicroFarad => "uF",
            ScopeUnit::NanoFarad => "nF",
            ScopeUnit::GigaOhm => "GOhm",
            ScopeUnit::MegaOhm => "MOhm",
            ScopeUnit::KiloOhm => "kOhm",
            ScopeUnit::Ohm => "Ohm",
            ScopeUnit::Percent => "%",
            ScopeUnit::MegaHertz => "MHz",
            ScopeUnit::KiloHertz => "kHz",
            ScopeUnit::Hertz => "Hz",
            ScopeUnit::Celsius => "°C",
            ScopeUnit::Fahrenheit => "°F",
            ScopeUnit::Seconds => "sec",
            ScopeUnit::MilliSeconds => "ms",
            ScopeUnit::MicroSeconds => "us",
            ScopeUnit::NanoSeconds => "ns",
            ScopeUnit::MicroAmpere => "uA",
            ScopeUnit::Minutes => "min",
            ScopeUnit::KiloWatt => "kW",
            ScopeUnit::PowerFactor => "PF",
        }
    }
}

impl TryFrom<u8> for ScopeUnit {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SCOPE_UNITS
            .get(value as usize)
            .copied()
            .ok_or(DecodeError::UnknownScopeUnit(value))
    }
}

impl fmt::Display for ScopeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Packed scope byte: bits 7..3 unit, bits 2..0 multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeByte(pub u8);

impl ScopeByte {
    pub fn unit_code(&self) -> u8 {
        self.0 >> 3
    }

    pub fn multiplier_code(&self) -> u8 {
        self.0 & 0b111
    }

    pub fn unit(&self) -> Result<ScopeUnit, DecodeError> {
        ScopeUnit::try_from(self.unit_code())
    }

    /// Decimal exponent of the multiplier, `None` if the device left it undefined.
    pub fn exponent(&self) -> Result<Option<i32>, DecodeError> {
        match self.multiplier_code() {
            0 => Ok(None),
            code @ 1..=4 => Ok(Some(-i32::from(code))),
            code => Err(DecodeError::UnknownScopeMultiplier(code)),
        }
    }

    pub fn multiplier(&self) -> Result<Option<f64>, DecodeError> {
        Ok(self.exponent()?.map(|exp| 10_f64.powi(exp)))
    }
}

/// Scale a raw sample by a power of ten.
///
/// Dividing for negative exponents keeps results like 1234 * 10^-2
/// at the nearest f64 to 12.34.
pub fn scale(sample: i32, exponent: i32) -> f64 {
    let sample = f64::from(sample);
    if exponent < 0 {
        sample / 10_f64.powi(-exponent)
    } else {
        sample * 10_f64.powi(exponent)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Active function, `None` for a human unit reading with an unsupported function code.
    pub function: Option<Function>,
    pub value: f64,
    pub unit: String,
    /// Decimal places resolved by the device.
    pub decimals: usize,
    pub auto_mode: bool,
    pub auto_range: bool,
}

impl Measurement {
    /// Scale the sample by the range of the active function.
    pub fn base_units(raw: &RawDisplay) -> Result<Self, DecodeError> {
        let function = Function::try_from(raw.function_code())?;
        let exponent = function.range_exponent(raw.range_code())?;

        Ok(Self {
            function: Some(function),
            value: scale(raw.sample, exponent),
            unit: function.base_unit().to_string(),
            decimals: exponent.min(0).unsigned_abs() as usize,
            auto_mode: raw.auto_mode(),
            auto_range: raw.auto_range(),
        })
    }

    /// Scale the sample by the scope byte, as the display shows it.
    pub fn human_units(raw: &RawDisplay) -> Result<Self, DecodeError> {
        let scope = ScopeByte(raw.scope);
        let unit = scope.unit()?;
        let exponent = scope.exponent()?.ok_or(DecodeError::UndefinedMultiplier)?;

        Ok(Self {
            function: Function::try_from(raw.function_code()).ok(),
            value: scale(raw.sample, exponent),
            unit: unit.symbol().to_string(),
            decimals: exponent.unsigned_abs() as usize,
            auto_mode: raw.auto_mode(),
            auto_range: raw.auto_range(),
        })
    }

    pub fn function_name(&self) -> &'static str {
        self.function.map(|f| f.name()).unwrap_or("Unknown")
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(self.decimals);
        let width = f.width().unwrap_or(0);

        f.write_fmt(format_args!(
            "{:>width$.prec$} {}",
            self.value, self.unit
        ))?;

        if f.alternate() {
            f.write_fmt(format_args!(" [{}", self.function_name()))?;
            if self.auto_range {
                f.write_str(", AUTO")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}
