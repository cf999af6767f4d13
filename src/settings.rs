//! Register encodings of the measurement profile written during `init`.
//!
//! The driver runs one fixed profile, [`Settings::DEFAULT`]. The types below
//! only describe how that profile maps onto the `ctrl_hum`, `ctrl_meas` and
//! `config` registers.

/// Oversampling settings for temperature, pressure and humidity.
///
/// Higher oversampling rates reduce noise but lengthen each conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Oversampling {
    /// No measurement performed, output is set to `0x80000` (`0x8000` for humidity).
    Skipped = 0b000,
    X1 = 0b001,
    X2 = 0b010,
    X4 = 0b011,
    X8 = 0b100,
    /// Maximum precision, longest conversion time.
    X16 = 0b101,
}

/// Sensor power mode, bits [1:0] of `ctrl_meas`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    Sleep = 0b00,
    Forced = 0b01,
    /// Continuous conversion, separated by the standby time.
    Normal = 0b11,
}

/// Inactive duration between two conversions in normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Standby {
    Micros500 = 0b000,
    Micros62500 = 0b001,
    Millis125 = 0b010,
    Millis250 = 0b011,
    Millis500 = 0b100,
    Millis1000 = 0b101,
    Millis10 = 0b110,
    Millis20 = 0b111,
}

/// Infinite Impulse Response (IIR) filter coefficient.
///
/// Smooths short-term disturbances of pressure and temperature.
/// Has no effect on humidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum IIRFilter {
    Off = 0b000,
    X2 = 0b001,
    X4 = 0b010,
    X8 = 0b011,
    X16 = 0b100,
}

/// Complete measurement profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub temp_osrs: Oversampling,
    pub pres_osrs: Oversampling,
    pub hum_osrs: Oversampling,
    pub mode: Mode,
    pub standby: Standby,
    pub iir_filter: IIRFilter,
}

impl Settings {
    /// Maximum oversampling on all channels, normal mode, 125 ms standby, filter off.
    pub const DEFAULT: Settings = Settings {
        temp_osrs: Oversampling::X16,
        pres_osrs: Oversampling::X16,
        hum_osrs: Oversampling::X16,
        mode: Mode::Normal,
        standby: Standby::Millis125,
        iir_filter: IIRFilter::Off,
    };

    /// Value of `ctrl_hum` (0xF2), bits [2:0] `osrs_h`.
    pub const fn ctrl_hum(&self) -> u8 {
        self.hum_osrs as u8
    }

    /// Value of `ctrl_meas` (0xF4): `osrs_t` [7:5], `osrs_p` [4:2], `mode` [1:0].
    pub const fn ctrl_meas(&self) -> u8 {
        ((self.temp_osrs as u8) << 5) | ((self.pres_osrs as u8) << 2) | self.mode as u8
    }

    /// Value of `config` (0xF5): `t_sb` [7:5], `filter` [4:2], `spi3w_en` [0] (always off).
    pub const fn config(&self) -> u8 {
        ((self.standby as u8) << 5) | ((self.iir_filter as u8) << 2)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_register_values() {
        let settings = Settings::default();
        assert_eq!(settings.ctrl_hum(), 0b0000_0101);
        assert_eq!(settings.ctrl_meas(), 0b1011_0111);
        assert_eq!(settings.config(), 0b0100_0000);
    }

    #[test]
    fn field_positions() {
        let settings = Settings {
            temp_osrs: Oversampling::X1,
            pres_osrs: Oversampling::Skipped,
            hum_osrs: Oversampling::X2,
            mode: Mode::Forced,
            standby: Standby::Millis20,
            iir_filter: IIRFilter::X16,
        };
        assert_eq!(settings.ctrl_hum(), 0b010);
        assert_eq!(settings.ctrl_meas(), 0b0010_0001);
        assert_eq!(settings.config(), 0b1111_0000);
    }
}
