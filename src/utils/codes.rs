//! Generación de OTP de embarque y códigos de reserva

use rand::{distributions::Alphanumeric, Rng};

/// Longitud del OTP numérico presentado al conductor
pub const OTP_LENGTH: usize = 4;

/// OTP numérico de 4 dígitos (con ceros a la izquierda)
pub fn generate_otp() -> String {
    let value: u32 = rand::thread_rng().gen_range(0..10_u32.pow(OTP_LENGTH as u32));
    format!("{:0width$}", value, width = OTP_LENGTH)
}

/// Código de reserva legible: prefijo ICB + 7 caracteres alfanuméricos
pub fn generate_booking_code() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("ICB{}", suffix)
}
