mod identity;
mod templates;
