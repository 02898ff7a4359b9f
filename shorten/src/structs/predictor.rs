//! Block predictors.
//!
//! DIFF0..DIFF3 use fixed polynomial predictors of order 0 to 3. QLPC reads
//! its own quantized coefficients from the stream.

use anyhow::{Result, bail};

use crate::structs::channel::ChannelHistory;
use crate::structs::command::{Command, LPCQSIZE, LPCQUANT};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::PredictorError;

/// Coefficients of the fixed predictors of order 1, 2 and 3.
static FIXED_COEFFS: [&[i32]; 3] = [&[1], &[2, -1], &[3, -3, 1]];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predictor {
    Fixed(usize),
    Qlpc(Vec<i32>),
}

impl Predictor {
    /// Reads the predictor of an audio command. QLPC coefficients follow
    /// the command in the stream; fixed predictors have none.
    pub fn read(reader: &mut BsIoSliceReader, cmd: Command, nwrap: usize) -> Result<Self> {
        if let Some(order) = cmd.fixed_order() {
            return Ok(Predictor::Fixed(order));
        }

        let order = reader.get_rice(LPCQSIZE)?;
        if order as usize > nwrap {
            bail!(PredictorError::InvalidOrder { order, nwrap });
        }

        let mut coeffs = Vec::with_capacity(order as usize);
        for _ in 0..order {
            coeffs.push(reader.get_rice_signed(LPCQUANT as i32)?);
        }

        Ok(Predictor::Qlpc(coeffs))
    }

    pub fn order(&self) -> usize {
        match self {
            Predictor::Fixed(order) => *order,
            Predictor::Qlpc(coeffs) => coeffs.len(),
        }
    }

    fn coeffs(&self) -> &[i32] {
        match self {
            Predictor::Fixed(0) => &[],
            Predictor::Fixed(order) => FIXED_COEFFS[order - 1],
            Predictor::Qlpc(coeffs) => coeffs,
        }
    }

    fn shift(&self) -> u32 {
        match self {
            Predictor::Fixed(_) => 0,
            Predictor::Qlpc(_) => LPCQUANT,
        }
    }

    /// Decodes one block of residuals into `history`.
    ///
    /// If a residual cannot be read the context samples are left as they
    /// were before the call.
    pub fn decode_block(
        &self,
        reader: &mut BsIoSliceReader,
        history: &mut ChannelHistory,
        block_size: usize,
        residual_size: i32,
        coffset: i32,
        lpcqoffset: i32,
    ) -> Result<()> {
        let order = self.order();
        let coeffs = self.coeffs();
        let shift = self.shift();
        let remove_offset = matches!(self, Predictor::Qlpc(_)) && coffset != 0;

        let base = history.nwrap();
        let samples = history.samples_mut();

        if remove_offset {
            for sample in &mut samples[base - order..base] {
                *sample = sample.wrapping_sub(coffset);
            }
        }

        let init_sum = match self {
            _ if order == 0 => coffset,
            Predictor::Qlpc(_) => lpcqoffset,
            Predictor::Fixed(_) => 0,
        };

        for pos in base..base + block_size {
            let mut sum = init_sum;
            for (j, coeff) in coeffs.iter().enumerate() {
                sum = sum.wrapping_add(coeff.wrapping_mul(samples[pos - j - 1]));
            }

            let residual = match reader.get_rice_signed(residual_size) {
                Ok(residual) => residual,
                Err(e) => {
                    if remove_offset {
                        for sample in &mut samples[base - order..base] {
                            *sample = sample.wrapping_add(coffset);
                        }
                    }
                    return Err(e.into());
                }
            };

            samples[pos] = residual.wrapping_add(sum >> shift);
        }

        if remove_offset {
            for sample in &mut samples[base..base + block_size] {
                *sample = sample.wrapping_add(coffset);
            }
        }

        Ok(())
    }
}
