mod fault;
mod sim;
