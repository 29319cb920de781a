pub mod gaussian_nb;
