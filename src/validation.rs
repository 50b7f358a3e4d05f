// src/validation.rs

//! Validación de campos del formulario. Funciones puras, sin I/O: el
//! asistente decide qué hacer con el error, acá sólo se calcula.

pub const EMAIL_ERROR: &str = "Formato de correo inválido";
pub const PHONE_ERROR: &str = "El número es muy corto";
pub const REQUIRED_ERROR: &str = "Campo requerido";

// Mínimo de caracteres que deben quedar tras limpiar el número
pub const MIN_PHONE_DIGITS: usize = 9;

// El correo es opcional: vacío es válido. Si hay algo, tiene que parecer
// local@dominio.tld de forma conservadora.
pub fn validate_email(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        return None;
    }
    if is_valid_email(value) {
        None
    } else {
        Some(EMAIL_ERROR)
    }
}

fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() {
        return false;
    }

    // El dominio necesita un punto interior: ni al principio ni al final
    let domain: Vec<char> = domain.chars().collect();
    domain.len() >= 3 && domain[1..domain.len() - 1].contains(&'.')
}

// Quita espacios, guiones y signos de más antes de contar. El prefijo de
// país viene pegado en el mismo valor ("+595 981...").
pub fn validate_phone(value: &str) -> Option<&'static str> {
    let digits = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '+')
        .count();

    if digits < MIN_PHONE_DIGITS {
        Some(PHONE_ERROR)
    } else {
        None
    }
}
