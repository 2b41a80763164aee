mod mock;
mod urc;
