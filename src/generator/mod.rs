pub mod hkid;
pub mod prc_id;
