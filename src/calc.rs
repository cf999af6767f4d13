use crate::{CalibData, FineTemperature, Humidity, Measurement, Pressure, RawData, Temperature};

impl CalibData {
    /// Converts the raw temperature ADC value to degrees Celsius.
    ///
    /// This is the compensation everything else depends on: the returned
    /// [`FineTemperature`] is a required input for pressure and humidity of
    /// the same measurement cycle.
    pub fn calc_temp(&self, temp_adc: u32) -> (Temperature, FineTemperature) {
        let adc = temp_adc as f64;
        let t1 = self.dig_t1 as f64;

        let var1 = (adc / 16384.0 - t1 / 1024.0) * self.dig_t2 as f64;
        let var2 = (adc / 131072.0 - t1 / 8192.0) * (adc / 131072.0 - t1 / 8192.0)
            * self.dig_t3 as f64;

        (
            Temperature((var1 + var2) / 5120.0),
            FineTemperature((var1 + var2) as i32),
        )
    }

    /// Converts the raw pressure ADC value to Pascal (Pa).
    ///
    /// Returns `Pressure(0.0)` if the calibration makes the divisor vanish
    /// (e.g. `dig_p1 == 0`). That value never occurs as a real reading.
    pub fn calc_pres(&self, t_fine: FineTemperature, press_adc: u32) -> Pressure {
        let mut var1 = t_fine.0 as f64 / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * self.dig_p6 as f64 / 32768.0;
        var2 += var1 * self.dig_p5 as f64 * 2.0;
        var2 = var2 / 4.0 + self.dig_p4 as f64 * 65536.0;
        var1 = (self.dig_p3 as f64 * var1 * var1 / 524288.0 + self.dig_p2 as f64 * var1)
            / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * self.dig_p1 as f64;

        if var1 == 0.0 {
            return Pressure(0.0);
        }

        let mut pres_comp = 1048576.0 - press_adc as f64;
        pres_comp = (pres_comp - var2 / 4096.0) * 6250.0 / var1;
        let var1 = self.dig_p9 as f64 * pres_comp * pres_comp / 2147483648.0;
        let var2 = pres_comp * self.dig_p8 as f64 / 32768.0;

        Pressure(pres_comp + (var1 + var2 + self.dig_p7 as f64) / 16.0)
    }

    /// Converts the raw humidity ADC value to relative humidity in percent,
    /// clamped to `0.0..=100.0`.
    pub fn calc_hum(&self, t_fine: FineTemperature, hum_adc: u16) -> Humidity {
        let mut hum = t_fine.0 as f64 - 76800.0;
        hum = (hum_adc as f64 - (self.dig_h4 as f64 * 64.0 + self.dig_h5 as f64 / 16384.0 * hum))
            * (self.dig_h2 as f64 / 65536.0
                * (1.0
                    + self.dig_h6 as f64 / 67108864.0
                        * hum
                        * (1.0 + self.dig_h3 as f64 / 67108864.0 * hum)));
        hum *= 1.0 - self.dig_h1 as f64 * hum / 524288.0;

        Humidity(hum.clamp(0.0, 100.0))
    }

    /// Compensates one complete sample.
    ///
    /// Temperature runs first; its fine temperature feeds pressure and humidity.
    pub fn compensate(&self, raw: &RawData) -> Measurement {
        let (temp, t_fine) = self.calc_temp(raw.temp_adc);

        Measurement {
            temp,
            pres: self.calc_pres(t_fine, raw.press_adc),
            hum: self.calc_hum(t_fine, raw.hum_adc),
        }
    }
}
